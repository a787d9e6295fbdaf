//! Authenticates against a single username/password pair given at
//! construction time.

use super::{AuthenticationError, Authenticator, DefaultUser};
use async_trait::async_trait;
use std::fmt::{self, Debug, Formatter};

/// [`Authenticator`] implementation that accepts exactly one
/// username/password combination.
///
/// ```rust
/// use ironftp::auth::StaticAuthenticator;
///
/// let auth = StaticAuthenticator::new("alice", "s3cr3t");
/// ```
pub struct StaticAuthenticator {
    username: String,
    password: String,
}

impl StaticAuthenticator {
    /// Creates an authenticator for the given credentials.
    pub fn new<S: Into<String>>(username: S, password: S) -> Self {
        StaticAuthenticator {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Debug for StaticAuthenticator {
    // The password stays out of the logs.
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("StaticAuthenticator").field("username", &self.username).finish()
    }
}

#[async_trait]
impl Authenticator<DefaultUser> for StaticAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> Result<DefaultUser, AuthenticationError> {
        if username != self.username {
            return Err(AuthenticationError::BadUser);
        }
        if password != self.password {
            return Err(AuthenticationError::BadPassword);
        }
        Ok(DefaultUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_the_configured_pair() {
        let auth = StaticAuthenticator::new("alice", "s3cr3t");
        assert_eq!(auth.authenticate("alice", "s3cr3t").await.unwrap(), DefaultUser);
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let auth = StaticAuthenticator::new("alice", "s3cr3t");
        assert!(matches!(
            auth.authenticate("alice", "nope").await,
            Err(AuthenticationError::BadPassword)
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_user() {
        let auth = StaticAuthenticator::new("alice", "s3cr3t");
        assert!(matches!(auth.authenticate("bob", "s3cr3t").await, Err(AuthenticationError::BadUser)));
    }
}
