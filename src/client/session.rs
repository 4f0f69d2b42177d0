use std::{
    future::Future,
    sync::{Mutex, PoisonError},
};

use tracing::{debug, warn};

use super::{
    api::{ApiClient, ClientError},
    events::{AuthEvents, Subscription},
    storage::SessionStorage,
};
use crate::{
    auth::dto::{AuthPayload, LoginRequest, RegisterRequest},
    routes::{settings::SettingsView, subscriptions::Subscription as ReminderSubscription},
    users::User,
};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Anonymous,
    Loading,
    Authenticated,
}

/// Snapshot handed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub status: AuthStatus,
    pub user: Option<User>,
    pub error: Option<String>,
    /// False while the session is restored from storage and no protected call
    /// has succeeded yet.
    pub confirmed: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            status: AuthStatus::Anonymous,
            user: None,
            error: None,
            confirmed: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }
}

/// Holds the signed-in user, mirrors it to durable storage and notifies
/// subscribers on every transition.
pub struct SessionStore<S> {
    api: ApiClient,
    storage: S,
    session: Mutex<Session>,
    events: AuthEvents,
}

impl<S: SessionStorage> SessionStore<S> {
    pub fn new(api: ApiClient, storage: S) -> Self {
        Self {
            api,
            storage,
            session: Mutex::new(Session::anonymous()),
            events: AuthEvents::new(),
        }
    }

    pub fn session(&self) -> Session {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    fn transition(&self, update: impl FnOnce(&mut Session)) -> Session {
        let snapshot = {
            let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            update(&mut session);
            session.clone()
        };
        self.events.emit(&snapshot);
        snapshot
    }

    fn clear_storage(&self) -> Result<(), ClientError> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)?;
        Ok(())
    }

    /// Restores the session from storage without asking the server.
    pub fn initialize(&self) -> Result<Session, ClientError> {
        let token = self.storage.get(TOKEN_KEY)?;
        let user = self
            .storage
            .get(USER_KEY)?
            .and_then(|raw| serde_json::from_str::<User>(&raw).ok());

        let restored = match (token, user) {
            (Some(_), Some(user)) => Some(user),
            (None, None) => None,
            _ => {
                warn!("partial session in storage; discarding");
                self.clear_storage()?;
                None
            }
        };

        Ok(self.transition(|s| {
            *s = Session::anonymous();
            if let Some(user) = restored {
                s.status = AuthStatus::Authenticated;
                s.user = Some(user);
            }
        }))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let body = LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        };
        self.sign_in(self.api.login(&body)).await
    }

    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<User, ClientError> {
        let body = RegisterRequest {
            email: Some(email.to_string()),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        };
        self.sign_in(self.api.register(&body)).await
    }

    async fn sign_in<F>(&self, call: F) -> Result<User, ClientError>
    where
        F: Future<Output = Result<AuthPayload, ClientError>>,
    {
        let before = self.transition(|s| {
            s.status = AuthStatus::Loading;
            s.error = None;
        });
        let previous_user = before.user;

        let outcome = match call.await {
            Ok(payload) => self.persist(&payload).map(|()| payload),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(AuthPayload { user, .. }) => {
                let signed_in = user.clone();
                self.transition(|s| {
                    s.status = AuthStatus::Authenticated;
                    s.user = Some(signed_in);
                    s.error = None;
                    s.confirmed = true;
                });
                debug!(user_id = %user.id, "signed in");
                Ok(user)
            }
            Err(e) => {
                let message = e.to_string();
                self.transition(|s| {
                    s.status = if previous_user.is_some() {
                        AuthStatus::Authenticated
                    } else {
                        AuthStatus::Anonymous
                    };
                    s.user = previous_user;
                    s.error = Some(message);
                });
                Err(e)
            }
        }
    }

    fn persist(&self, payload: &AuthPayload) -> Result<(), ClientError> {
        let user = serde_json::to_string(&payload.user)
            .map_err(|e| ClientError::Protocol(e.to_string()))?;
        self.storage.set(TOKEN_KEY, &payload.token)?;
        self.storage.set(USER_KEY, &user)?;
        Ok(())
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        let cleared = self.clear_storage();
        self.transition(|s| *s = Session::anonymous());
        cleared
    }

    pub fn clear_error(&self) {
        self.transition(|s| s.error = None);
    }

    /// Runs a protected call with the stored token. A 401 ends the session.
    async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, ClientError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let token = self
            .storage
            .get(TOKEN_KEY)?
            .ok_or(ClientError::NotAuthenticated)?;

        match call(token).await {
            Ok(value) => {
                let unconfirmed = {
                    let s = self.session.lock().unwrap_or_else(PoisonError::into_inner);
                    s.is_authenticated() && !s.confirmed
                };
                if unconfirmed {
                    self.transition(|s| s.confirmed = true);
                }
                Ok(value)
            }
            Err(e) if e.is_unauthorized() => {
                warn!(error = %e, "session rejected by server");
                let cleared = self.clear_storage();
                self.transition(|s| {
                    *s = Session::anonymous();
                    s.error = Some(ClientError::SessionExpired.to_string());
                });
                cleared?;
                Err(ClientError::SessionExpired)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn subscriptions(&self) -> Result<Vec<ReminderSubscription>, ClientError> {
        self.authorized(|token| async move { self.api.subscriptions(&token).await })
            .await
    }

    pub async fn settings(&self) -> Result<SettingsView, ClientError> {
        self.authorized(|token| async move { self.api.settings(&token).await })
            .await
    }

    pub async fn upload_avatar(&self) -> Result<Option<String>, ClientError> {
        self.authorized(|token| async move { self.api.upload_avatar(&token).await })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::build_app,
        auth::handlers::INVALID_CREDENTIALS,
        client::{FileStorage, MemoryStorage},
        state::AppState,
    };
    use std::sync::Arc;

    async fn spawn_server() -> String {
        let (state, _repo) = AppState::in_memory();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_app(state)).await.unwrap();
        });
        format!("http://{addr}")
    }

    type Seen = Arc<Mutex<Vec<AuthStatus>>>;

    fn record<S: SessionStorage>(store: &SessionStore<S>) -> (Seen, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = store.subscribe(move |s| sink.lock().unwrap().push(s.status));
        (seen, sub)
    }

    #[tokio::test]
    async fn register_signs_in_and_persists() {
        let base = spawn_server().await;
        let store = SessionStore::new(ApiClient::new(&base), MemoryStorage::new());
        let (seen, _sub) = record(&store);

        let user = store.register("a@b.com", "alice", "secret1").await.unwrap();
        assert_eq!(user.username, "alice");

        let session = store.session();
        assert!(session.is_authenticated());
        assert!(session.confirmed);
        assert_eq!(session.user.as_ref(), Some(&user));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![AuthStatus::Loading, AuthStatus::Authenticated]
        );

        assert!(store.storage().get(TOKEN_KEY).unwrap().is_some());
        let raw = store.storage().get(USER_KEY).unwrap().unwrap();
        let stored: User = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, user);

        assert!(store.subscriptions().await.unwrap().is_empty());
        assert!(store.settings().await.unwrap().push_enabled);
        assert!(store.upload_avatar().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_login_keeps_anonymous_with_error() {
        let base = spawn_server().await;
        let store = SessionStore::new(ApiClient::new(&base), MemoryStorage::new());

        let err = store.login("nobody@b.com", "secret1").await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 401, .. }));

        let session = store.session();
        assert_eq!(session.status, AuthStatus::Anonymous);
        assert_eq!(session.error.as_deref(), Some(INVALID_CREDENTIALS));
        assert!(store.storage().get(TOKEN_KEY).unwrap().is_none());

        store.clear_error();
        assert!(store.session().error.is_none());
    }

    #[tokio::test]
    async fn rejected_token_forces_sign_out() {
        let base = spawn_server().await;
        let store = SessionStore::new(ApiClient::new(&base), MemoryStorage::new());
        store.register("a@b.com", "alice", "secret1").await.unwrap();
        let (seen, _sub) = record(&store);

        let mut token = store.storage().get(TOKEN_KEY).unwrap().unwrap();
        let last = token.pop().unwrap();
        token.push(if last == 'A' { 'B' } else { 'A' });
        store.storage().set(TOKEN_KEY, &token).unwrap();

        let err = store.subscriptions().await.unwrap_err();
        assert!(matches!(err, ClientError::SessionExpired));
        assert_eq!(store.session().status, AuthStatus::Anonymous);
        assert!(store.session().user.is_none());
        assert!(store.storage().get(TOKEN_KEY).unwrap().is_none());
        assert!(store.storage().get(USER_KEY).unwrap().is_none());
        assert_eq!(*seen.lock().unwrap(), vec![AuthStatus::Anonymous]);

        assert!(matches!(
            store.subscriptions().await.unwrap_err(),
            ClientError::NotAuthenticated
        ));
    }

    #[tokio::test]
    async fn restored_session_is_provisional_until_confirmed() {
        let base = spawn_server().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        {
            let store = SessionStore::new(ApiClient::new(&base), FileStorage::open(&path).unwrap());
            store.register("a@b.com", "alice", "secret1").await.unwrap();
        }

        let store = SessionStore::new(ApiClient::new(&base), FileStorage::open(&path).unwrap());
        assert_eq!(store.session().status, AuthStatus::Anonymous);

        let restored = store.initialize().unwrap();
        assert!(restored.is_authenticated());
        assert!(!restored.confirmed);
        assert_eq!(restored.user.unwrap().email, "a@b.com");

        store.settings().await.unwrap();
        assert!(store.session().confirmed);
    }

    #[tokio::test]
    async fn logout_clears_and_notifies() {
        let base = spawn_server().await;
        let store = SessionStore::new(ApiClient::new(&base), MemoryStorage::new());
        store.register("a@b.com", "alice", "secret1").await.unwrap();

        let (seen, sub) = record(&store);
        store.logout().unwrap();
        assert_eq!(store.session(), Session::anonymous());
        assert!(store.storage().get(TOKEN_KEY).unwrap().is_none());
        assert_eq!(*seen.lock().unwrap(), vec![AuthStatus::Anonymous]);

        sub.unsubscribe();
        store.login("a@b.com", "secret1").await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn partial_storage_is_discarded() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "orphan").unwrap();
        let store = SessionStore::new(ApiClient::new("http://127.0.0.1:9"), storage);

        let session = store.initialize().unwrap();
        assert_eq!(session.status, AuthStatus::Anonymous);
        assert!(store.storage().get(TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn health_check() {
        let base = spawn_server().await;
        let health = ApiClient::new(base).health().await.unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.env, "development");
    }
}
