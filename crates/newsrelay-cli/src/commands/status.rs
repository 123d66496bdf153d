use anyhow::Result;

use newsrelay_core::{sync::CursorStore, AppConfig};

pub async fn run(config: &AppConfig) -> Result<()> {
    let store = super::open_store(config).await?;

    match store.load().await? {
        Some(cursor) => {
            println!("Team:      {}", store.stream());
            println!("Last sent: {}", cursor.last_article);
            println!("Published: {}", cursor.last_published_at.format("%Y-%m-%d %H:%M"));
        }
        None => {
            println!("No cursor stored for {}.", store.stream());
            println!("The next run records the newest article without sending anything.");
        }
    }

    Ok(())
}
