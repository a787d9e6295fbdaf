//! The RFC 959 List (`LIST`) command
//
// Sends one `ls -l` style line per entry of the named directory (or the
// cwd) over the data connection. Listings are always sent in the textual
// form, whatever the negotiated TYPE.

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
pub struct List {
    path: Option<String>,
}

impl List {
    pub fn new(path: Option<String>) -> Self {
        List { path }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for List
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
                    if let Err(err) = tx.send(DataChanCmd::List { path: target }).await {
                        slog::warn!(logger, "Could not notify data channel of LIST: {}", err);
                    }
                });
                Ok(Reply::new(ReplyCode::FileStatusOkay, "Opening ASCII mode data connection for file list"))
            }
            None => Ok(Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection")),
        }
    }
}
