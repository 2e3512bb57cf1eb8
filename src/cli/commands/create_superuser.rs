use crate::config::Config;
use crate::db::Store;
use crate::services::{SeaOrmUserService, UserService};

pub async fn cmd_create_superuser(
    config: &Config,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let store = Store::from_config(config).await?;
    let users = SeaOrmUserService::new(store, config.security.clone());

    let profile = users.create_superuser(email, password).await?;

    println!("✓ Superuser created: {}", profile.email);
    Ok(())
}
