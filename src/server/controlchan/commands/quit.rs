//! The RFC 959 Logout (`QUIT`) command

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
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Quit;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Quit
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let tx = args.tx_control_chan.clone();
        let logger = args.logger;
        // The goodbye goes out first; the exit message makes the loop
        // stop right after.
        tokio::spawn(async move {
            if let Err(err) = tx.send(ControlChanMsg::ExitControlLoop).await {
                slog::warn!(logger, "Could not send the exit message: {}", err);
            }
        });
        Ok(Reply::new(ReplyCode::ClosingControlConnection, "Service closing control connection"))
    }
}
