//! The RFC 959 Status (`STAT`) command
//
// Without an argument this reports on the server; with a path it sends
// the listing of that path over the control channel instead of a data
// channel.

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
pub struct Stat {
    path: Option<String>,
}

impl Stat {
    pub fn new(path: Option<String>) -> Self {
        Stat { path }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Stat
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &self.path {
            None => return Ok(Reply::new(ReplyCode::SystemStatus, "Server status: healthy")),
            Some(path) => path,
        };

        let session = args.session.lock().await;
        let storage: Arc<Storage> = Arc::clone(&session.storage);
        let target = path::resolve(&session.cwd, path);
        let user = session.user.clone();
        let Some(user) = (*user).as_ref() else {
            return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in"));
        };

        match storage.list(user, &target).await {
            Ok(entries) => {
                let mut lines: Vec<String> = vec![format!("Status of {}:", target.display())];
                lines.extend(entries.iter().map(|fi| fi.to_string()));
                lines.push("End of status".to_string());
                Ok(Reply::new_multiline(ReplyCode::SystemStatus, lines))
            }
            Err(err) => {
                let tx = args.tx_control_chan.clone();
                if let Err(err) = tx.send(ControlChanMsg::StorageError(err)).await {
                    slog::warn!(args.logger, "Could not send internal message to notify of STAT error: {}", err);
                }
                Ok(Reply::none())
            }
        }
    }
}
