use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::storage::StorageError;
use crate::{
    auth::dto::{AuthPayload, LoginRequest, RegisterRequest},
    envelope::ApiResponse,
    routes::{health::HealthStatus, settings::SettingsView, subscriptions::Subscription},
};

const REQUEST_FAILED: &str = "request failed";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a failure envelope; `message` is its error text.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("session expired, please sign in again")]
    SessionExpired,
    #[error("not signed in")]
    NotAuthenticated,
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("session storage: {0}")]
    Storage(#[from] StorageError),
    #[error("unexpected response: {0}")]
    Protocol(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ClientError::Api { status, .. } if *status == StatusCode::UNAUTHORIZED.as_u16()
        )
    }
}

/// Thin typed wrapper over the HTTP API. Holds no session state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let envelope = serde_json::from_slice::<ApiResponse<T>>(&bytes).ok();

        if !status.is_success() {
            let message = envelope
                .and_then(|e| e.error)
                .unwrap_or_else(|| REQUEST_FAILED.to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope = envelope
            .ok_or_else(|| ClientError::Protocol(format!("{status} with unreadable body")))?;
        if !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope.error.unwrap_or_else(|| REQUEST_FAILED.to_string()),
            });
        }
        envelope
            .data
            .ok_or_else(|| ClientError::Protocol("success envelope without data".into()))
    }

    /// Like `send`, for endpoints that answer with a message and no data.
    async fn send_message(&self, request: RequestBuilder) -> Result<Option<String>, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let envelope = response.json::<ApiResponse<serde_json::Value>>().await.ok();
        match envelope {
            Some(e) if status.is_success() && e.success => Ok(e.message),
            other => Err(ClientError::Api {
                status: status.as_u16(),
                message: other
                    .and_then(|e| e.error)
                    .unwrap_or_else(|| REQUEST_FAILED.to_string()),
            }),
        }
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.http.get(self.url("/api/health")).send().await?;
        Ok(response.error_for_status()?.json().await?)
    }

    pub async fn register(&self, body: &RegisterRequest) -> Result<AuthPayload, ClientError> {
        self.send(self.http.post(self.url("/api/auth/register")).json(body))
            .await
    }

    pub async fn login(&self, body: &LoginRequest) -> Result<AuthPayload, ClientError> {
        self.send(self.http.post(self.url("/api/auth/login")).json(body))
            .await
    }

    pub async fn subscriptions(&self, token: &str) -> Result<Vec<Subscription>, ClientError> {
        self.send(self.http.get(self.url("/api/subscriptions")).bearer_auth(token))
            .await
    }

    pub async fn settings(&self, token: &str) -> Result<SettingsView, ClientError> {
        self.send(self.http.get(self.url("/api/settings")).bearer_auth(token))
            .await
    }

    pub async fn upload_avatar(&self, token: &str) -> Result<Option<String>, ClientError> {
        self.send_message(self.http.post(self.url("/api/upload/avatar")).bearer_auth(token))
            .await
    }
}
