//! The RFC 959 Delete (`DELE`) command

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
pub struct Dele {
    path: String,
}

impl Dele {
    pub fn new(path: String) -> Self {
        Dele { path }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Dele
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
        let tx = args.tx_control_chan.clone();
        let logger = args.logger;
        tokio::spawn(async move {
            let Some(user) = (*user).as_ref() else {
                return;
            };
            let msg = match storage.del(user, &target).await {
                Ok(()) => {
                    slog::info!(logger, "Removed file {:?}", target);
                    ControlChanMsg::DelFileSuccess
                }
                Err(err) => ControlChanMsg::StorageError(err),
            };
            if let Err(err) = tx.send(msg).await {
                slog::warn!(logger, "Could not send internal message to notify of DELE result: {}", err);
            }
        });
        Ok(Reply::none())
    }
}
