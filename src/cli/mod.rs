pub mod db;
pub mod maintenance;
pub mod server;
pub mod user;

use lnatprep_user::{Command, SqliteStore};

/// Single-pool command for one-shot CLI work.
async fn command(config: &lnatprep::Config) -> anyhow::Result<Command<SqliteStore>> {
    let pool = lnatprep::db::create_pool(&config.database.url, 1).await?;

    Ok(lnatprep::command(config, pool.clone(), pool))
}
