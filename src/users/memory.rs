use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CreateUserError, NewUser, User, UserRecord, UserRepo, UserSettings};

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    settings: HashMap<Uuid, UserSettings>,
}

/// Process-local credential store for development and tests.
#[derive(Default)]
pub struct MemoryUserRepo {
    tables: Mutex<Tables>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .map(UserRecord::into_public))
    }

    async fn find_settings(&self, user_id: Uuid) -> anyhow::Result<Option<UserSettings>> {
        Ok(self.tables.lock().await.settings.get(&user_id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, CreateUserError> {
        // Checks and inserts happen under one lock acquisition.
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.email == new_user.email) {
            return Err(CreateUserError::EmailTaken);
        }
        if tables.users.iter().any(|u| u.username == new_user.username) {
            return Err(CreateUserError::UsernameTaken);
        }

        let now = OffsetDateTime::now_utc();
        let record = UserRecord {
            id: new_user.id,
            email: new_user.email,
            username: new_user.username,
            password_hash: new_user.password_hash,
            phone: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        tables
            .settings
            .insert(record.id, UserSettings::defaults_for(record.id, now));
        tables.users.push(record.clone());
        Ok(record.into_public())
    }
}
