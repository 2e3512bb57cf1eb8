use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Store;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Poll the database once per second until `SELECT 1` succeeds.
pub async fn cmd_wait_for_db(config: &Config, timeout_secs: u64) -> anyhow::Result<()> {
    let url = &config.general.database_path;
    let timeout = Duration::from_secs(timeout_secs);

    info!("Waiting for database...");

    tokio::time::timeout(timeout, async {
        loop {
            match try_ping(url).await {
                Ok(()) => break,
                Err(e) => {
                    warn!(error = %e, "Database unavailable, waiting 1 second...");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    })
    .await
    .with_context(|| format!("Database did not become available within {timeout_secs}s"))?;

    info!("Database available!");
    Ok(())
}

async fn try_ping(url: &str) -> anyhow::Result<()> {
    let conn = Store::connect(url, 1, 1).await?;
    Store { conn }.ping().await
}
