//! The RFC 959 Data Port (`PORT`) command
//
// The argument is a HOST-PORT specification for the data port to be used
// for the next transfer: h1,h2,h3,h4,p1,p2 where h1 is the high order
// 8 bits of the internet host address and the port is p1 * 256 + p2.
// The server dials that endpoint when the transfer begins.

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
use std::net::{SocketAddr, SocketAddrV4};

#[derive(Debug)]
pub struct Port {
    addr: SocketAddrV4,
}

impl Port {
    pub fn new(addr: SocketAddrV4) -> Self {
        Port { addr }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Port
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        active_common::enter_active_mode(&args, SocketAddr::V4(self.addr)).await;
        Ok(Reply::new(ReplyCode::CommandOkay, "PORT command successful"))
    }
}
