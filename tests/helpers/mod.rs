#![allow(dead_code)]

use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use lnatprep::{
    AppState, Config,
    config::{DatabaseConfig, EntitlementConfig, JwtConfig, ObservabilityConfig, ServerConfig},
};
use lnatprep_shared::{FixedClock, user::Role};
use lnatprep_user::{Command, RegisterInput, SqliteStore, Store, UserUpdate};
use serde_json::Value;
use time::{OffsetDateTime, macros::datetime};
use tower::ServiceExt;

pub const NOW: OffsetDateTime = datetime!(2025-03-01 12:00 UTC);

pub struct TestApp {
    pub config: Config,
    pub command: Command<SqliteStore>,
    pub clock: FixedClock,
    pub router: Router,
}

pub async fn setup_test_app(path: PathBuf) -> anyhow::Result<TestApp> {
    let url = format!("sqlite:{}", path.display());
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 3000,
        },
        database: DatabaseConfig {
            url: url.to_owned(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test_secret_key_minimum_32_characters_long".to_owned(),
            expiration_days: 7,
        },
        observability: ObservabilityConfig::default(),
        entitlement: EntitlementConfig::default(),
    };

    let pool = lnatprep::db::create_pool(&url, 1).await?;
    lnatprep::db::migrate(&pool).await?;

    let clock = FixedClock::new(NOW);
    let command = lnatprep::command(&config, pool.clone(), pool.clone()).with_clock(clock.clone());

    let router = lnatprep::router(AppState {
        config: config.clone(),
        command: command.clone(),
        pool,
    });

    Ok(TestApp {
        config,
        command,
        clock,
        router,
    })
}

impl TestApp {
    pub async fn create_user(&self, name: &str) -> anyhow::Result<String> {
        Ok(self
            .command
            .register(RegisterInput {
                email: format!("{name}@lnatprep.localhost"),
            })
            .await?)
    }

    pub async fn create_admin(&self, name: &str) -> anyhow::Result<String> {
        let id = self.create_user(name).await?;
        self.command.set_role(&id, Role::Admin).await?;

        Ok(id)
    }

    /// Registered user with the registration trial and subscription removed.
    pub async fn create_lapsed_user(&self, name: &str) -> anyhow::Result<String> {
        let id = self.create_user(name).await?;
        self.command
            .store
            .update_user(
                &id,
                &UserUpdate {
                    trial_ends_at: Some(None),
                    subscription: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        Ok(id)
    }

    pub fn token(&self, user_id: &str) -> anyhow::Result<String> {
        lnatprep::auth::generate_token(&self.config.jwt, user_id.to_owned(), Role::User)
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(user_id) = user_id {
            let bearer = format!("Bearer {}", self.token(user_id)?);
            builder = builder.header(header::AUTHORIZATION, bearer);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok((status, value))
    }
}
