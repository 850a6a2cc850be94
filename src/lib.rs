pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod observability;
pub mod routes;

pub use config::Config;
pub use routes::{AppState, router};

use lnatprep_user::{Command, SqliteStore};
use sqlx::SqlitePool;

/// Entitlement service over separate read and write pools, tuned from the
/// `entitlement` config section.
pub fn command(
    config: &Config,
    read_pool: SqlitePool,
    write_pool: SqlitePool,
) -> Command<SqliteStore> {
    Command::new(SqliteStore::new(read_pool, write_pool))
        .with_options(config.entitlement.options())
}
