//! The service provider interface (SPI) for auth

use super::UserDetail;
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

/// Defines the requirements for authentication implementations
#[async_trait]
pub trait Authenticator<User>: Sync + Send + Debug
where
    User: UserDetail,
{
    /// Authenticate the given user with the given password.
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthenticationError>;
}

/// The error type for authentication failures
#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// The username is not known.
    #[error("unknown user")]
    BadUser,
    /// The password did not match.
    #[error("bad password")]
    BadPassword,
}
