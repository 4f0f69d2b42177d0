//! Subscription-reminder backend: registration, login and bearer-token
//! protected endpoints, plus a client SDK holding the browser-style session.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod cors;
pub mod envelope;
pub mod error;
pub mod routes;
pub mod state;
pub mod users;
pub mod validation;

pub use app::{build_app, serve};
pub use config::AppConfig;
pub use state::AppState;
