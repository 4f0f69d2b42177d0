//! Client side of the API: a typed HTTP client and a session store that keeps
//! the signed-in user in durable storage and tells subscribers when it changes.

mod api;
mod events;
mod session;
mod storage;

pub use api::{ApiClient, ClientError};
pub use events::{AuthEvents, Subscription};
pub use session::{AuthStatus, Session, SessionStore, TOKEN_KEY, USER_KEY};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};
