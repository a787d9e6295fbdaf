use thiserror::Error;

/// The error type returned by the command parser.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The client issued a command we don't know about.
    #[error("unknown command: {command}")]
    UnknownCommand {
        /// The verb that we don't know about
        command: String,
    },
    /// The client issued a command that we know, but with a missing or
    /// malformed argument.
    #[error("invalid command (invalid parameter)")]
    InvalidCommand,
    /// The line did not end in (CR)LF.
    #[error("invalid end-of-line")]
    InvalidEol,
    /// A command contained a byte outside of the printable ASCII range.
    #[error("invalid character in command: {token:#x}")]
    InvalidToken {
        /// The offending byte
        token: u8,
    },
    /// We encountered non-UTF8 bytes where text was expected.
    #[error("non-UTF8 character in command")]
    InvalidUtf8,
}

pub type Result<T> = std::result::Result<T, ParseError>;

impl From<std::str::Utf8Error> for ParseError {
    fn from(_: std::str::Utf8Error) -> Self {
        ParseError::InvalidUtf8
    }
}
