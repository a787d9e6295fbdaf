//! Contains the service provider interface for authentication and the
//! built-in static (single user/password pair) authenticator.

mod authenticator;
mod static_auth;
mod user;

pub use authenticator::{AuthenticationError, Authenticator};
pub use static_auth::StaticAuthenticator;
pub use user::{DefaultUser, UserDetail};
