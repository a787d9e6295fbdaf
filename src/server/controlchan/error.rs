//! Contains the `ControlChanError` struct that defines the control
//! channel error type.

use super::parse_error::ParseError;
use thiserror::Error;

/// The error type of the control channel.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct ControlChanError {
    kind: ControlChanErrorKind,
}

/// A list specifying categories of control channel errors.
#[derive(Eq, PartialEq, Debug, Error)]
pub enum ControlChanErrorKind {
    /// We encountered a system IO error.
    #[error("failed to perform io")]
    Io,
    /// The client issued a command we don't know about.
    #[error("unknown command: {command}")]
    UnknownCommand {
        /// The verb that we don't know about
        command: String,
    },
    /// The client issued a command that we know about, but in an invalid
    /// way (e.g. `USER` without a username).
    #[error("invalid command (invalid parameter)")]
    InvalidCommand,
    /// We encountered a non-UTF8 character in the command.
    #[error("non-UTF8 character in command")]
    Utf8Error,
    /// A command line exceeded the maximum length.
    #[error("command line too long")]
    LineTooLong,
    /// The control channel idle timer elapsed.
    #[error("read timeout on the control channel")]
    ControlChannelTimeout,
    /// Internal server error, e.g. a channel that should be set up is
    /// missing. This is a bug.
    #[error("internal server error")]
    InternalServerError,
}

impl ControlChanError {
    /// Creates a new control channel error of the given kind
    pub fn new(kind: ControlChanErrorKind) -> Self {
        ControlChanError { kind }
    }

    /// Return the inner error kind of this error.
    pub fn kind(&self) -> &ControlChanErrorKind {
        &self.kind
    }
}

impl From<ControlChanErrorKind> for ControlChanError {
    fn from(kind: ControlChanErrorKind) -> ControlChanError {
        ControlChanError { kind }
    }
}

impl From<std::io::Error> for ControlChanError {
    fn from(_: std::io::Error) -> ControlChanError {
        ControlChanErrorKind::Io.into()
    }
}

impl From<std::str::Utf8Error> for ControlChanError {
    fn from(_: std::str::Utf8Error) -> ControlChanError {
        ControlChanErrorKind::Utf8Error.into()
    }
}

impl From<ParseError> for ControlChanError {
    fn from(err: ParseError) -> ControlChanError {
        match err {
            ParseError::UnknownCommand { command } => ControlChanErrorKind::UnknownCommand { command }.into(),
            ParseError::InvalidUtf8 => ControlChanErrorKind::Utf8Error.into(),
            ParseError::InvalidToken { .. } => ControlChanErrorKind::Utf8Error.into(),
            _ => ControlChanErrorKind::InvalidCommand.into(),
        }
    }
}
