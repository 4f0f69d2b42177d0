mod claims;
pub mod dto;
pub mod extractors;
pub mod handlers;
mod jwt;
pub mod password;

pub use claims::Claims;
pub use extractors::{authenticate, require_auth, CurrentUser};
pub use handlers::auth_routes as router;
pub use jwt::{TokenError, TokenService};
