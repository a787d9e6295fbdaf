//! The RFC 2428 Extended Data Port (`EPRT`) command
//
// Active mode with an address family aware argument: |1|h|p| for IPv4
// and |2|h|p| for IPv6.

use super::active_common;
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
use std::net::SocketAddr;

#[derive(Debug)]
pub struct Eprt {
    addr: SocketAddr,
}

impl Eprt {
    pub fn new(addr: SocketAddr) -> Self {
        Eprt { addr }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Eprt
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        active_common::enter_active_mode(&args, self.addr).await;
        Ok(Reply::new(ReplyCode::CommandOkay, "EPRT command successful"))
    }
}
