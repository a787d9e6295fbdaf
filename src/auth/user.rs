use std::fmt::{self, Debug, Display, Formatter};

/// UserDetail defines the requirements for implementations that hold
/// information about an authenticated user.
pub trait UserDetail: Send + Sync + Display + Debug {}

/// DefaultUser is a minimal [`UserDetail`] implementation used by servers
/// that only care whether a client authenticated, not who it is.
#[derive(Debug, PartialEq, Eq)]
pub struct DefaultUser;

impl UserDetail for DefaultUser {}

impl Display for DefaultUser {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "DefaultUser")
    }
}
