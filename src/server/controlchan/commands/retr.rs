//! The RFC 959 Retrieve (`RETR`) command
//
// This command causes the server-DTP to transfer a copy of the file,
// specified in the pathname, to the other end of the data connection.

use crate::{
    auth::UserDetail,
    server::{
        chancomms::DataChanCmd,
        controlchan::{
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
        session::TransferType,
    },
    storage::{path, Metadata, StorageBackend},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Retr {
    path: String,
}

impl Retr {
    pub fn new(path: String) -> Self {
        Retr { path }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Retr
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let target = path::resolve(&session.cwd, &self.path);
        let type_name = match session.transfer_type {
            TransferType::Ascii => "ASCII",
            TransferType::Image => "BINARY",
        };
        match session.data_cmd_tx.take() {
            Some(tx) => {
                let logger = args.logger;
                tokio::spawn(async move {
                    if let Err(err) = tx.send(DataChanCmd::Retr { path: target }).await {
                        slog::warn!(logger, "Could not notify data channel of RETR: {}", err);
                    }
                });
                Ok(Reply::new_with_string(
                    ReplyCode::FileStatusOkay,
                    format!("Opening {} mode data connection for {}", type_name, self.path),
                ))
            }
            None => Ok(Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection")),
        }
    }
}
