//! The RFC 2428 Extended Passive (`EPSV`) command
//
// Like PASV, but the reply carries only the TCP port, which makes it
// address family agnostic.

use super::passive_common;
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
pub struct Epsv;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Epsv
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        passive_common::enter_passive_mode(args, |port| {
            Reply::new_with_string(
                ReplyCode::EnteringExtendedPassiveMode,
                format!("Entering Extended Passive Mode (|||{}|)", port),
            )
        })
        .await
    }
}
