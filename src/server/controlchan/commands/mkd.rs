//! The RFC 959 Make Directory (`MKD`) command

use crate::{
    auth::UserDetail,
    server::{
        chancomms::ControlChanMsg,
        controlchan::{
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
        ftpserver::options::ServerMode,
    },
    storage::{path, Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Mkd {
    path: String,
}

impl Mkd {
    pub fn new(path: String) -> Self {
        Mkd { path }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Mkd
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        if args.mode == ServerMode::ReadOnly {
            return Ok(Reply::new(ReplyCode::FileError, "Permission denied"));
        }
        let session = args.session.lock().await;
        let storage = Arc::clone(&session.storage);
        let user = session.user.clone();
        let target = path::resolve(&session.cwd, &self.path);
        // The 257 reply echoes the path exactly as the client gave it.
        let given = self.path.clone();
        let tx = args.tx_control_chan.clone();
        let logger = args.logger;
        tokio::spawn(async move {
            let Some(user) = (*user).as_ref() else {
                return;
            };
            let msg = match storage.mkd(user, &target).await {
                Ok(()) => ControlChanMsg::MkDirSuccess { path: given },
                Err(err) => ControlChanMsg::StorageError(err),
            };
            if let Err(err) = tx.send(msg).await {
                slog::warn!(logger, "Could not send internal message to notify of MKD result: {}", err);
            }
        });
        Ok(Reply::none())
    }
}
