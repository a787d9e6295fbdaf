//! The RFC 959 Passive (`PASV`) command
//
// This command requests the server-DTP to "listen" on a data port and to
// wait for a connection rather than initiate one upon receipt of a
// transfer command. The response includes the host and port the server
// is listening on, as six comma separated decimals.

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
use std::net::SocketAddr;

#[derive(Debug)]
pub struct Pasv;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Pasv
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        // The reply format only fits IPv4; IPv6 clients use EPSV.
        let octets = match args.local_addr {
            SocketAddr::V4(addr) => addr.ip().octets(),
            SocketAddr::V6(_) => {
                return Ok(Reply::new(ReplyCode::CommandNotImplemented, "PASV not available on IPv6, use EPSV"));
            }
        };

        passive_common::enter_passive_mode(args, |port| {
            let p1 = port >> 8;
            let p2 = port & 0xff;
            Reply::new_with_string(
                ReplyCode::EnteringPassiveMode,
                format!("Entering Passive Mode ({},{},{},{},{},{})", octets[0], octets[1], octets[2], octets[3], p1, p2),
            )
        })
        .await
    }
}
