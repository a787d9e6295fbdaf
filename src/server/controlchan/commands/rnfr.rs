//! The RFC 959 Rename From (`RNFR`) command
//
// First half of the rename pair. Stages the source path; the state is
// dropped again unless the very next command is RNTO.

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
pub struct Rnfr {
    path: String,
}

impl Rnfr {
    pub fn new(path: String) -> Self {
        Rnfr { path }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Rnfr
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
        let storage: Arc<Storage> = Arc::clone(&session.storage);
        let target = path::resolve(&session.cwd, &self.path);
        let user = session.user.clone();
        let Some(user) = (*user).as_ref() else {
            return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in"));
        };

        // The source must exist before we promise anything.
        match storage.metadata(user, &target).await {
            Ok(_) => {
                session.rename_from = Some(target);
                Ok(Reply::new(ReplyCode::FileActionPending, "Requested file action pending further information"))
            }
            Err(err) => {
                let tx = args.tx_control_chan.clone();
                if let Err(err) = tx.send(ControlChanMsg::StorageError(err)).await {
                    slog::warn!(args.logger, "Could not send internal message to notify of RNFR error: {}", err);
                }
                Ok(Reply::none())
            }
        }
    }
}
