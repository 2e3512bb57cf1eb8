mod create_superuser;
mod init_config;
mod migrate;
mod wait_for_db;

pub use create_superuser::cmd_create_superuser;
pub use init_config::cmd_init_config;
pub use migrate::cmd_migrate;
pub use wait_for_db::cmd_wait_for_db;
