//! The RFC 959 Abort (`ABOR`) command
//
// Cancels the transfer in progress, if any, and discards the pending
// data endpoint. A cancelled transfer answers 426 followed by 226 once
// the data connection is down; with nothing in flight a single 226 is
// enough.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        Reply, ReplyCode,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Abor;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Abor
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        // Whatever happens, this endpoint is spent.
        session.data_cmd_tx = None;
        let busy = session.data_busy;
        if let Some(tx) = session.data_abort_tx.take() {
            let logger = args.logger;
            tokio::spawn(async move {
                if let Err(err) = tx.send(()).await {
                    slog::warn!(logger, "Could not send abort to the data channel task: {}", err);
                }
            });
            if busy {
                // The data task confirms the cancellation, which turns
                // into the closing 226.
                return Ok(Reply::new(ReplyCode::ConnectionClosed, "Connection closed; transfer aborted"));
            }
        }
        Ok(Reply::new(ReplyCode::ClosingDataConnection, "Closing data connection"))
    }
}
