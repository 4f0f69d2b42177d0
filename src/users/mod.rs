use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryUserRepo;
pub use postgres::PgUserRepo;

/// Public part of the user returned to the client. Never carries the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub updated_at: OffsetDateTime,
}

/// User row including the Argon2 hash; only login needs it.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl UserRecord {
    pub fn into_public(self) -> User {
        User {
            id: self.id,
            email: self.email,
            username: self.username,
            phone: self.phone,
            avatar_url: self.avatar_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-to-one settings row, created together with the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_id: Uuid,
    pub show_lunar: bool,
    pub push_enabled: bool,
    pub theme: Theme,
    #[serde(with = "time::serde::timestamp")]
    pub updated_at: OffsetDateTime,
}

impl UserSettings {
    pub fn defaults_for(user_id: Uuid, now: OffsetDateTime) -> Self {
        Self {
            user_id,
            show_lunar: false,
            push_enabled: true,
            theme: Theme::System,
            updated_at: now,
        }
    }
}

/// Everything needed to insert a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Error)]
pub enum CreateUserError {
    #[error("email already registered")]
    EmailTaken,
    #[error("username already taken")]
    UsernameTaken,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Credential store. Implementations must make `create` atomic: either the user
/// and its default settings both exist afterwards, or neither does.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Full record including the password hash.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>>;

    /// Public fields only.
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    async fn find_settings(&self, user_id: Uuid) -> anyhow::Result<Option<UserSettings>>;

    /// Inserts the user and its default settings. Email uniqueness is checked
    /// before username uniqueness.
    async fn create(&self, new_user: NewUser) -> Result<User, CreateUserError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn public_user_json_shape() {
        let user = User {
            id: Uuid::nil(),
            email: "a@b.com".into(),
            username: "alice".into(),
            phone: None,
            avatar_url: Some("https://cdn.example/a.png".into()),
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "email": "a@b.com",
                "username": "alice",
                "avatarUrl": "https://cdn.example/a.png",
                "createdAt": 1704067200,
                "updatedAt": 1704067200,
            })
        );
        let back: User = serde_json::from_value(value).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn settings_defaults() {
        let s = UserSettings::defaults_for(Uuid::nil(), datetime!(2024-01-01 0:00 UTC));
        assert!(!s.show_lunar);
        assert!(s.push_enabled);
        assert_eq!(s.theme, Theme::System);
        assert_eq!(serde_json::to_value(s.theme).unwrap(), json!("system"));
    }

    #[test]
    fn theme_parse() {
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("Dark"), None);
        assert_eq!(Theme::Light.to_string(), "light");
    }
}
