//! The RFC 959 Password (`PASS`) command
//
// The argument field is a Telnet string specifying the user's password.
// This command must be immediately preceded by the user name command.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
        password::Password,
        session::SessionState,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Pass {
    password: Password,
}

impl Pass {
    pub fn new(password: Password) -> Self {
        Pass { password }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Pass
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        match session.state {
            SessionState::WaitPass => {
                let pass: &str = std::str::from_utf8(self.password.as_ref())?;
                let username: String = match session.username.clone() {
                    Some(v) => v,
                    None => {
                        slog::error!(args.logger, "WaitPass state without a username. This is a bug.");
                        return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in"));
                    }
                };
                match args.authenticator.authenticate(&username, pass).await {
                    Ok(user) => {
                        slog::info!(args.logger, "User {} logged in", username);
                        session.user = Arc::new(Some(user));
                        session.state = SessionState::WaitCmd;
                        Ok(Reply::new(ReplyCode::UserLoggedIn, "User logged in, proceed"))
                    }
                    Err(err) => {
                        slog::warn!(args.logger, "Failed login attempt for user {}: {}", username, err);
                        session.username = None;
                        session.state = SessionState::New;
                        Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in"))
                    }
                }
            }
            SessionState::New => Ok(Reply::new(ReplyCode::BadCommandSequence, "Please supply a username first")),
            SessionState::WaitCmd => Ok(Reply::new(ReplyCode::BadCommandSequence, "Already logged in")),
        }
    }
}
