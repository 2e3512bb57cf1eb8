use crate::config::Config;
use crate::db::Store;

pub async fn cmd_migrate(config: &Config) -> anyhow::Result<()> {
    let conn = Store::connect(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    Store { conn }.migrate().await?;

    println!("✓ Database is up to date: {}", config.general.database_path);
    Ok(())
}
