//! The RFC 959 User Name (`USER`) command

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
        session::SessionState,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

#[derive(Debug)]
pub struct User {
    username: Bytes,
}

impl User {
    pub fn new(username: Bytes) -> Self {
        User { username }
    }
}

#[async_trait]
impl<Storage, UserDet> CommandHandler<Storage, UserDet> for User
where
    UserDet: UserDetail + 'static,
    Storage: StorageBackend<UserDet> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, UserDet>) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        // USER is also accepted when already logged in: it starts a
        // re-login and drops the current authentication.
        let username = std::str::from_utf8(&self.username)?;
        session.username = Some(username.to_string());
        session.user = Arc::new(None);
        session.state = SessionState::WaitPass;
        Ok(Reply::new(ReplyCode::NeedPassword, "User name okay, need password"))
    }
}
