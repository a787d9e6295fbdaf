//! The RFC 3659 File Size (`SIZE`) command
//
// RFC 3659 ties the reported size to the transfer type; we report the
// on-disk size under either type, which is what clients expect in
// practice.

use crate::{
    auth::UserDetail,
    server::{
        chancomms::ControlChanMsg,
        controlchan::{
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
    },
    storage::{path, ErrorKind, Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Size {
    path: String,
}

impl Size {
    pub fn new(path: String) -> Self {
        Size { path }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Size
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
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
            let msg = match storage.metadata(user, &target).await {
                Ok(meta) if meta.is_file() => {
                    ControlChanMsg::CommandChannelReply(Reply::new_with_string(ReplyCode::FileStatus, meta.len().to_string()))
                }
                // SIZE is defined for files only.
                Ok(_) => ControlChanMsg::StorageError(ErrorKind::PermanentFileNotAvailable.into()),
                Err(err) => ControlChanMsg::StorageError(err),
            };
            if let Err(err) = tx.send(msg).await {
                slog::warn!(logger, "Could not send internal message to notify of SIZE result: {}", err);
            }
        });
        Ok(Reply::none())
    }
}
