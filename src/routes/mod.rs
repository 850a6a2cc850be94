mod admin;
mod health;
mod me;

use axum::{Router, routing::get};
use lnatprep_user::{Command, SqliteStore};
use sqlx::SqlitePool;

pub use health::{health, ready};

#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub command: Command<SqliteStore>,
    pub pool: SqlitePool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(state.pool.clone())
        .merge(
            Router::new()
                .route("/me/entitlements", get(me::entitlements))
                .nest("/admin", admin::router())
                .with_state(state),
        )
}
