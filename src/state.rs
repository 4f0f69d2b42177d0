use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::users::{MemoryUserRepo, PgUserRepo, UserRepo};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub tokens: TokenService,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let tokens = TokenService::new(&config.jwt).context("jwt config")?;

        let users: Arc<dyn UserRepo> = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgUserRepo::new(db))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; users are kept in memory");
                Arc::new(MemoryUserRepo::new())
            }
        };

        Ok(Self {
            config,
            users,
            tokens,
        })
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserRepo>) -> anyhow::Result<Self> {
        let tokens = TokenService::new(&config.jwt)?;
        Ok(Self {
            config,
            users,
            tokens,
        })
    }

    /// Development config over an empty in-memory store.
    pub fn in_memory() -> (Self, Arc<MemoryUserRepo>) {
        let repo = Arc::new(MemoryUserRepo::new());
        let config = Arc::new(AppConfig::development());
        let tokens = TokenService::new(&config.jwt).expect("development jwt config is valid");
        let state = Self {
            config,
            users: repo.clone(),
            tokens,
        };
        (state, repo)
    }
}
