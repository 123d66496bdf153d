use anyhow::Result;

use newsrelay_core::AppConfig;

pub async fn run(config: &AppConfig) -> Result<()> {
    let cycle = super::build_cycle(config).await?;
    let report = cycle.run_once(super::now()).await?;
    println!("Cycle {}", report.cycle_id);

    match report.bootstrapped {
        Some(cursor) => println!(
            "First run for {}: anchored at {} ({}), {} existing articles skipped.",
            config.feed.team, cursor.last_article, cursor.last_published_at, report.fetched
        ),
        None => println!(
            "{}: {} articles in the {} list, {} delivered.",
            config.feed.team, report.fetched, report.date, report.delivered
        ),
    }

    Ok(())
}
