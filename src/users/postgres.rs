use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{CreateUserError, NewUser, Theme, User, UserRecord, UserRepo, UserSettings};

const EMAIL_UNIQUE: &str = "users_email_key";
const USERNAME_UNIQUE: &str = "users_username_key";

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct SettingsRow {
    user_id: Uuid,
    show_lunar: bool,
    push_enabled: bool,
    theme: String,
    updated_at: OffsetDateTime,
}

/// Maps a unique violation to the conflict it reports, by constraint name.
fn map_unique(constraint: Option<&str>) -> CreateUserError {
    match constraint {
        Some(EMAIL_UNIQUE) => CreateUserError::EmailTaken,
        Some(USERNAME_UNIQUE) => CreateUserError::UsernameTaken,
        Some(other) => CreateUserError::Other(anyhow::anyhow!("unique violation on {other}")),
        None => CreateUserError::Other(anyhow::anyhow!("unique violation without constraint name")),
    }
}

impl From<sqlx::Error> for CreateUserError {
    fn from(e: sqlx::Error) -> Self {
        match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => map_unique(db_err.constraint()),
            _ => CreateUserError::Other(e.into()),
        }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, username, password_hash, phone, avatar_url, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, phone, avatar_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_settings(&self, user_id: Uuid) -> anyhow::Result<Option<UserSettings>> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT user_id, show_lunar, push_enabled, theme, updated_at
            FROM user_settings
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find user settings")?;

        row.map(|r| -> anyhow::Result<UserSettings> {
            let theme = Theme::parse(&r.theme)
                .with_context(|| format!("unknown theme {:?} for user {}", r.theme, r.user_id))?;
            Ok(UserSettings {
                user_id: r.user_id,
                show_lunar: r.show_lunar,
                push_enabled: r.push_enabled,
                theme,
                updated_at: r.updated_at,
            })
        })
        .transpose()
    }

    async fn create(&self, new_user: NewUser) -> Result<User, CreateUserError> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let email_owner: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
            .bind(&new_user.email)
            .fetch_optional(&mut *tx)
            .await?;
        if email_owner.is_some() {
            return Err(CreateUserError::EmailTaken);
        }

        let username_owner: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
                .bind(&new_user.username)
                .fetch_optional(&mut *tx)
                .await?;
        if username_owner.is_some() {
            return Err(CreateUserError::UsernameTaken);
        }

        // Unique constraints still guard the insert against a concurrent registration.
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, username, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, username, phone, avatar_url, created_at, updated_at
            "#,
        )
        .bind(new_user.id)
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let defaults = UserSettings::defaults_for(user.id, user.created_at);
        sqlx::query(
            r#"
            INSERT INTO user_settings (user_id, show_lunar, push_enabled, theme)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(defaults.user_id)
        .bind(defaults.show_lunar)
        .bind(defaults.push_enabled)
        .bind(defaults.theme.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await.context("commit tx")?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violations_map_by_constraint() {
        assert!(matches!(map_unique(Some("users_email_key")), CreateUserError::EmailTaken));
        assert!(matches!(
            map_unique(Some("users_username_key")),
            CreateUserError::UsernameTaken
        ));
        assert!(matches!(
            map_unique(Some("user_settings_pkey")),
            CreateUserError::Other(e) if e.to_string().contains("user_settings_pkey")
        ));
        assert!(matches!(map_unique(None), CreateUserError::Other(_)));
    }

    #[test]
    fn non_database_errors_stay_internal() {
        let err = CreateUserError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, CreateUserError::Other(_)));
    }
}
