//! Session tokens: HS256 JWTs carried in an HTTP-only `token` cookie.

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Environment;
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "token";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    environment: Environment,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_hours: i64, environment: Environment) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
            environment,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Returns the user id of a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Option<Uuid> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims.sub)
            .ok()
    }

    /// Cross-site cookies need `SameSite=None; Secure`; local development runs
    /// over plain HTTP and uses `Lax`.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        let dev = self.environment == Environment::Dev;
        Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .path("/")
            .secure(!dev)
            .same_site(if dev { SameSite::Lax } else { SameSite::None })
            .max_age(time::Duration::seconds(self.ttl.num_seconds()))
            .build()
    }
}

/// The user behind a valid session cookie. Rejects with 401 otherwise.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;
        let user_id = state.sessions.verify(&token).ok_or(AppError::Unauthorized)?;
        let user = state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let keys = SessionKeys::new("secret", 24, Environment::Dev);
        let id = Uuid::new_v4();
        let token = keys.issue(id).unwrap();
        assert_eq!(keys.verify(&token), Some(id));
        assert_eq!(SessionKeys::new("other", 24, Environment::Dev).verify(&token), None);
        assert_eq!(keys.verify("garbage"), None);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Well past the default 60s leeway.
        let keys = SessionKeys::new("secret", -1, Environment::Dev);
        let token = keys.issue(Uuid::new_v4()).unwrap();
        assert_eq!(keys.verify(&token), None);
    }

    #[test]
    fn test_cookie_attributes_follow_environment() {
        let dev = SessionKeys::new("s", 24, Environment::Dev).session_cookie("t".into());
        assert_eq!(dev.http_only(), Some(true));
        assert_eq!(dev.secure(), Some(false));
        assert_eq!(dev.same_site(), Some(SameSite::Lax));
        assert_eq!(dev.max_age(), Some(time::Duration::days(1)));

        let prod = SessionKeys::new("s", 24, Environment::Production).session_cookie("t".into());
        assert_eq!(prod.secure(), Some(true));
        assert_eq!(prod.same_site(), Some(SameSite::None));
    }
}
