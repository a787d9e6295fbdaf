//! The RFC 3659 Modification Time (`MDTM`) command

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
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug)]
pub struct Mdtm {
    path: String,
}

impl Mdtm {
    pub fn new(path: String) -> Self {
        Mdtm { path }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Mdtm
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
                Ok(meta) => match meta.modified() {
                    Ok(modified) => {
                        // RFC 3659: time-val is YYYYMMDDHHMMSS in UTC.
                        let stamp = DateTime::<Utc>::from(modified).format("%Y%m%d%H%M%S");
                        ControlChanMsg::CommandChannelReply(Reply::new_with_string(ReplyCode::FileStatus, stamp.to_string()))
                    }
                    Err(_) => ControlChanMsg::StorageError(ErrorKind::LocalError.into()),
                },
                Err(err) => ControlChanMsg::StorageError(err),
            };
            if let Err(err) = tx.send(msg).await {
                slog::warn!(logger, "Could not send internal message to notify of MDTM result: {}", err);
            }
        });
        Ok(Reply::none())
    }
}
