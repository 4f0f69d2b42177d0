use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use anyhow::Context;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::Claims;
use crate::{
    config::{JwtConfig, MAX_TTL_MINUTES},
    users::User,
};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies HS256 access tokens. Stateless: nothing is stored
/// server side, so a token stays valid until it expires.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(cfg: &JwtConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(!cfg.secret.is_empty(), "jwt secret must not be empty");
        anyhow::ensure!(
            (1..=MAX_TTL_MINUTES).contains(&cfg.ttl_minutes),
            "jwt ttl must be between 1 and {MAX_TTL_MINUTES} minutes"
        );

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
            ttl: Duration::minutes(cfg.ttl_minutes),
        })
    }

    pub fn issue(&self, user: &User) -> anyhow::Result<String> {
        self.issue_at(user, OffsetDateTime::now_utc())
    }

    fn issue_at(&self, user: &User, now: OffsetDateTime) -> anyhow::Result<String> {
        let expires = now
            .checked_add(self.ttl)
            .context("token expiry out of range")?;
        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            iat: now.unix_timestamp(),
            exp: expires.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user.id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            }
        })?;
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}
