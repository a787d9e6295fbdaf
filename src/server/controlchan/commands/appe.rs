//! The RFC 959 Append (`APPE`) command
//
// Like STOR, except that an existing file grows at the end instead of
// being replaced.

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
pub struct Appe {
    path: String,
}

impl Appe {
    pub fn new(path: String) -> Self {
        Appe { path }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Appe
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
                    if let Err(err) = tx.send(DataChanCmd::Appe { path: target }).await {
                        slog::warn!(logger, "Could not notify data channel of APPE: {}", err);
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
