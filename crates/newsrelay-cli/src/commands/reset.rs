use anyhow::Result;

use newsrelay_core::AppConfig;

pub async fn run(config: &AppConfig) -> Result<()> {
    let store = super::open_store(config).await?;

    if store.reset().await? {
        println!("Cursor for {} removed.", store.stream());
    } else {
        println!("No cursor stored for {}.", store.stream());
    }

    Ok(())
}
