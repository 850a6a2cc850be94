use std::time::{SystemTime, UNIX_EPOCH};

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    extract::CookieJar,
    headers::{Authorization, HeaderMapExt, authorization::Bearer},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use lnatprep_shared::user::{Role, State};
use lnatprep_user::User;
use serde::{Deserialize, Serialize};

use crate::{config::JwtConfig, error::AppError, routes::AppState};

pub const AUTH_COOKIE_NAME: &str = "auth_token";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    /// Role at issue time. Informational only, admin checks read the store.
    pub role: Role,
    pub exp: u64,
    pub iat: u64,
}

pub fn generate_token(config: &JwtConfig, sub: String, role: Role) -> anyhow::Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let lifetime = config.expiration_days.max(0) as u64 * 24 * 60 * 60;
    let claims = Claims {
        sub,
        role,
        exp: now + lifetime,
        iat: now,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(config: &JwtConfig, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(data.claims)
}

/// Bearer header first, then the auth cookie.
fn token_from_parts(parts: &Parts) -> Option<String> {
    if let Some(Authorization(bearer)) = parts.headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_owned());
    }

    CookieJar::from_headers(&parts.headers)
        .get(AUTH_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
}

/// Caller authenticated by JWT whose account still exists and is not
/// suspended.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or(AppError::Unauthorized)?;

        let claims = decode_token(&state.config.jwt, &token).map_err(|err| {
            tracing::debug!(err = %err, "rejected auth token");
            AppError::Unauthorized
        })?;

        let Some(user) = state.command.load(&claims.sub).await? else {
            return Err(AppError::Unauthorized);
        };

        if user.state == State::Suspended {
            tracing::warn!(user_id = %user.id, "suspended user attempted a request");
            return Err(AppError::Forbidden);
        }

        Ok(AuthUser(user))
    }
}

/// [`AuthUser`] whose stored role is admin. The role is read from the store
/// on every request, never from the token.
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            tracing::error!(
                user_id = %user.id,
                "Non-admin user attempted to access admin route"
            );
            return Err(AppError::Forbidden);
        }

        Ok(AdminUser(user))
    }
}
