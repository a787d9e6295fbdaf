//! Contains code shared by the PORT and EPRT commands.

use super::passive_common::setup_inter_loop_comms;
use crate::{
    auth::UserDetail,
    server::{
        controlchan::handler::CommandContext,
        datachan::{self, DataConnect},
    },
    storage::{Metadata, StorageBackend},
};
use std::net::SocketAddr;

// Registers the client's endpoint as the data endpoint for the next
// transfer. The actual TCP connection is only dialed once the transfer
// command arrives.
pub(crate) async fn enter_active_mode<Storage, User>(args: &CommandContext<Storage, User>, peer: SocketAddr)
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    setup_inter_loop_comms(args.session.clone(), args.tx_control_chan.clone()).await;
    datachan::spawn_processing(args.logger.clone(), args.session.clone(), DataConnect::Dial(peer)).await;
}
