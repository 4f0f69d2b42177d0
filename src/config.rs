use std::fmt;

use anyhow::{bail, ensure, Context};

/// Placeholder secret shipped in sample env files. Never acceptable outside development.
pub const PLACEHOLDER_JWT_SECRET: &str = "your-secret-key-min-32-characters-long";

/// Upper bound for `JWT_TTL_MINUTES`: one week.
pub const MAX_TTL_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Other(String),
}

impl Environment {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "development" | "dev" => Environment::Development,
            "production" | "prod" => Environment::Production,
            other => Environment::Other(other.to_string()),
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Other(name) => name,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub cors_dev_origin: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::parse(&lookup("ENVIRONMENT").unwrap_or_default());

        let secret = match lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(s) if s != PLACEHOLDER_JWT_SECRET => s,
            _ if environment.is_development() => {
                tracing::warn!("JWT_SECRET not set; using the development placeholder");
                PLACEHOLDER_JWT_SECRET.to_string()
            }
            _ => bail!("JWT_SECRET must be set to a non-default value in {environment}"),
        };

        let ttl_minutes = match lookup("JWT_TTL_MINUTES") {
            Some(v) => v
                .parse::<i64>()
                .with_context(|| format!("JWT_TTL_MINUTES is not a number: {v}"))?,
            None => 15,
        };
        ensure!(
            (1..=MAX_TTL_MINUTES).contains(&ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {ttl_minutes}"
        );

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        if database_url.is_none() && !environment.is_development() {
            bail!("DATABASE_URL must be set in {environment}");
        }

        let port = match lookup("APP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("APP_PORT is not a port: {v}"))?,
            None => 8080,
        };

        Ok(Self {
            environment,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            database_url,
            jwt: JwtConfig {
                secret,
                ttl_minutes,
            },
            cors_dev_origin: lookup("CORS_DEV_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".into()),
        })
    }

    /// Development config with an in-memory store, used by tests and local tooling.
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            host: "127.0.0.1".into(),
            port: 0,
            database_url: None,
            jwt: JwtConfig {
                secret: "test-secret-that-is-long-enough-123".into(),
                ttl_minutes: 15,
            },
            cors_dev_origin: "http://localhost:5173".into(),
        }
    }
}
