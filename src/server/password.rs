use std::fmt;

/// The password of a client. Wrapped so that it never ends up in log
/// output through a derived `Debug`.
#[derive(PartialEq, Eq, Clone)]
pub struct Password(bytes::Bytes);

impl Password {
    pub fn new<B: Into<bytes::Bytes>>(bytes: B) -> Self {
        Password(bytes.into())
    }
}

impl AsRef<[u8]> for Password {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Password(bytes::Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "********")
    }
}
