//! The RFC 959 Name List (`NLST`) command
//
// Like LIST, but each line carries only the bare name.

use crate::{
    auth::UserDetail,
    server::{
        chancomms::DataChanCmd,
        controlchan::{
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
    },
    storage::{path, Metadata, StorageBackend},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Nlst {
    path: Option<String>,
}

impl Nlst {
    pub fn new(path: Option<String>) -> Self {
        Nlst { path }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Nlst
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let target = match &self.path {
            Some(path) => path::resolve(&session.cwd, path),
            None => session.cwd.clone(),
        };
        match session.data_cmd_tx.take() {
            Some(tx) => {
                let logger = args.logger;
                tokio::spawn(async move {
                    if let Err(err) = tx.send(DataChanCmd::Nlst { path: target }).await {
                        slog::warn!(logger, "Could not notify data channel of NLST: {}", err);
                    }
                });
                Ok(Reply::new(ReplyCode::FileStatusOkay, "Opening ASCII mode data connection for file list"))
            }
            None => Ok(Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection")),
        }
    }
}
