//! Contains code shared by the PASV and EPSV commands.

use crate::{
    auth::UserDetail,
    server::{
        chancomms::{ControlChanMsg, DataChanCmd},
        controlchan::{error::ControlChanError, handler::CommandContext, Reply, ReplyCode},
        datachan::{self, DataConnect},
        session::SharedSession,
    },
    storage::{Metadata, StorageBackend},
};
use std::{io, net::SocketAddr, ops::RangeInclusive, time::Duration};
use tokio::net::TcpSocket;
use tokio::sync::mpsc::{channel, Receiver, Sender};

const BIND_RETRIES: u8 = 10;

// How long the passive listener waits for the client to connect.
const ACCEPT_TIMEOUT: Duration = Duration::from_secs(15);

// Binds a random port from the configured range on the address the
// control connection came in on.
pub(crate) fn try_port_range(local_addr: SocketAddr, passive_ports: RangeInclusive<u16>) -> io::Result<TcpSocket> {
    let ip = local_addr.ip();
    let range_length = u32::from(passive_ports.end() - passive_ports.start()) + 1;

    let mut socket: io::Result<TcpSocket> = Err(io::Error::new(io::ErrorKind::AddrInUse, "no free port in the passive range"));

    for _ in 0..BIND_RETRIES {
        let random_u32 = {
            let mut data = [0; 4];
            getrandom::fill(&mut data).map_err(|_| io::Error::new(io::ErrorKind::Other, "rng failure"))?;
            u32::from_ne_bytes(data)
        };

        let port = random_u32 % range_length + u32::from(*passive_ports.start());
        let s = match ip {
            std::net::IpAddr::V4(_) => TcpSocket::new_v4()?,
            std::net::IpAddr::V6(_) => TcpSocket::new_v6()?,
        };
        s.set_reuseaddr(true)?;
        if s.bind(SocketAddr::new(ip, port as u16)).is_ok() {
            socket = Ok(s);
            break;
        }
    }

    socket
}

// Installs the channel pairs through which the control loop and the data
// channel task of the upcoming transfer talk to each other. Any channels
// from a previous, unconsumed endpoint are simply replaced.
pub(crate) async fn setup_inter_loop_comms<Storage, User>(session: SharedSession<Storage, User>, control_loop_tx: Sender<ControlChanMsg>)
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    let (cmd_tx, cmd_rx): (Sender<DataChanCmd>, Receiver<DataChanCmd>) = channel(1);
    let (data_abort_tx, data_abort_rx): (Sender<()>, Receiver<()>) = channel(1);

    let mut session = session.lock().await;
    session.data_cmd_tx = Some(cmd_tx);
    session.data_cmd_rx = Some(cmd_rx);
    session.data_abort_tx = Some(data_abort_tx);
    session.data_abort_rx = Some(data_abort_rx);
    session.control_msg_tx = Some(control_loop_tx);
}

// Binds a listener for one data connection, announces it through the
// reply built by `make_reply`, and spawns the task that accepts the
// client and serves one transfer on it.
pub(crate) async fn enter_passive_mode<Storage, User, F>(args: CommandContext<Storage, User>, make_reply: F) -> Result<Reply, ControlChanError>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
    F: FnOnce(u16) -> Reply,
{
    let socket = match try_port_range(args.local_addr, args.passive_ports.clone()) {
        Ok(socket) => socket,
        Err(err) => {
            slog::warn!(args.logger, "Could not bind a passive port: {}", err);
            return Ok(Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection"));
        }
    };
    let listener = socket.listen(1024)?;
    let port = listener.local_addr()?.port();

    let reply = make_reply(port);

    setup_inter_loop_comms(args.session.clone(), args.tx_control_chan.clone()).await;

    // Accept the data connection in a separate task; the client only
    // dials after it saw the reply.
    let logger = args.logger.clone();
    let session = args.session.clone();
    tokio::spawn(async move {
        match tokio::time::timeout(ACCEPT_TIMEOUT, listener.accept()).await {
            Ok(Ok((socket, _remote))) => datachan::spawn_processing(logger, session, DataConnect::Accepted(socket)).await,
            Ok(Err(err)) => slog::error!(logger, "Error waiting for data connection: {}", err),
            Err(_) => slog::warn!(logger, "Client did not connect to the data port in time"),
        }
    });

    Ok(reply)
}
