//! The RFC 959 Store (`STOR`) command
//
// This command causes the server-DTP to accept the data transferred via
// the data connection and to store it as a file. An existing file is
// replaced; a new file is created otherwise.

use crate::{
    auth::UserDetail,
    server::{
        chancomms::DataChanCmd,
        controlchan::{
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
        ftpserver::options::ServerMode,
        session::TransferType,
    },
    storage::{path, Metadata, StorageBackend},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Stor {
    path: String,
}

impl Stor {
    pub fn new(path: String) -> Self {
        Stor { path }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Stor
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
        let target = path::resolve(&session.cwd, &self.path);
        let type_name = match session.transfer_type {
            TransferType::Ascii => "ASCII",
            TransferType::Image => "BINARY",
        };
        match session.data_cmd_tx.take() {
            Some(tx) => {
                let logger = args.logger;
                tokio::spawn(async move {
                    if let Err(err) = tx.send(DataChanCmd::Stor { path: target }).await {
                        slog::warn!(logger, "Could not notify data channel of STOR: {}", err);
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
