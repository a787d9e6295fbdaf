//! The RFC 959 Rename To (`RNTO`) command
//
// Second half of the rename pair. Only valid directly after RNFR.

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
pub struct Rnto {
    path: String,
}

impl Rnto {
    pub fn new(path: String) -> Self {
        Rnto { path }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Rnto
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        if args.mode == ServerMode::ReadOnly {
            return Ok(Reply::new(ReplyCode::FileError, "Permission denied"));
        }
        let mut session = args.session.lock().await;
        let from = match session.rename_from.take() {
            Some(from) => from,
            None => return Ok(Reply::new(ReplyCode::BadCommandSequence, "Issue RNFR first")),
        };
        let storage = Arc::clone(&session.storage);
        let user = session.user.clone();
        let to = path::resolve(&session.cwd, &self.path);
        let tx = args.tx_control_chan.clone();
        let logger = args.logger;
        tokio::spawn(async move {
            let Some(user) = (*user).as_ref() else {
                return;
            };
            let msg = match storage.rename(user, &from, &to).await {
                Ok(()) => {
                    slog::info!(logger, "Renamed {:?} to {:?}", from, to);
                    ControlChanMsg::RenameSuccess
                }
                Err(err) => ControlChanMsg::StorageError(err),
            };
            if let Err(err) = tx.send(msg).await {
                slog::warn!(logger, "Could not send internal message to notify of RNTO result: {}", err);
            }
        });
        Ok(Reply::none())
    }
}
