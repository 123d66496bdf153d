use std::sync::Arc;

use anyhow::Result;

use newsrelay_core::{notify::Notifier, sync::Resolution, AppConfig, Error};

/// Stands in for the configured notifier so a preview needs no credentials
struct DryRunNotifier;

#[async_trait::async_trait]
impl Notifier for DryRunNotifier {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn send(&self, _destination: &str, _text: &str) -> newsrelay_core::Result<()> {
        Err(Error::Notify("preview never sends".to_string()))
    }
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let cycle = super::assemble(config, Arc::new(DryRunNotifier)).await?;
    let preview = cycle.preview(super::now()).await?;

    println!(
        "{} list for {}: {} articles",
        config.feed.team,
        preview.snapshot.date,
        preview.snapshot.len()
    );
    match preview.cursor {
        Some(ref cursor) => println!("Cursor: {} ({})", cursor.last_article, cursor.last_published_at),
        None => println!("Cursor: none"),
    }
    println!();

    match &preview.resolution {
        Resolution::Idle => println!("Nothing to do."),
        Resolution::Bootstrap(cursor) => println!(
            "Next run anchors at {} ({}) and sends nothing.",
            cursor.last_article, cursor.last_published_at
        ),
        Resolution::Deliver { articles, strategy } => {
            if articles.is_empty() {
                println!("No new articles.");
                return Ok(());
            }

            println!("Would send {} articles (matched by {}):\n", articles.len(), strategy);
            for article in articles {
                println!(
                    "  {}  {}  {}",
                    article.published_at.format("%Y-%m-%d %H:%M"),
                    article.office_name,
                    article.title
                );
                println!("    {}", article.url());
            }
        }
    }

    Ok(())
}
