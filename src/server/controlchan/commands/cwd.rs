//! The RFC 959 Change Working Directory (`CWD`) command

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
    storage::{path, Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Cwd {
    path: String,
}

impl Cwd {
    pub fn new(path: String) -> Self {
        Cwd { path }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Cwd
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let storage: Arc<Storage> = Arc::clone(&session.storage);
        let target = path::resolve(&session.cwd, &self.path);
        let user = session.user.clone();
        let Some(user) = (*user).as_ref() else {
            return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in"));
        };

        match storage.metadata(user, &target).await {
            Ok(meta) if meta.is_dir() => {
                session.cwd = target;
                Ok(Reply::new_with_string(
                    ReplyCode::FileActionOkay,
                    format!("Directory changed to {}", session.cwd.display()),
                ))
            }
            Ok(_) => Ok(Reply::new(ReplyCode::FileError, "Not a directory")),
            Err(err) => {
                slog::warn!(args.logger, "Failed to cwd to {:?}: {}", target, err);
                let tx = args.tx_control_chan.clone();
                if let Err(err) = tx.send(ControlChanMsg::StorageError(err)).await {
                    slog::warn!(args.logger, "Could not send internal message to notify of CWD error: {}", err);
                }
                Ok(Reply::none())
            }
        }
    }
}
