use crate::{
    auth::{Authenticator, UserDetail},
    server::{
        chancomms::ControlChanMsg,
        controlchan::{
            auth::AuthMiddleware,
            codecs::FtpCodec,
            command::Command,
            commands,
            error::{ControlChanError, ControlChanErrorKind},
            handler::{CommandContext, CommandHandler},
            log::LoggingMiddleware,
            middleware::ControlChanMiddleware,
            Event, Reply, ReplyCode,
        },
        ftpserver::options::ServerMode,
        session::SharedSession,
        shutdown, Session,
    },
    storage::{ErrorKind, Metadata, StorageBackend},
};

use futures_util::{SinkExt, StreamExt};
use std::{net::SocketAddr, ops::RangeInclusive, sync::Arc, time::Duration};
use tokio::{
    net::TcpStream,
    sync::{
        mpsc::{channel, Receiver, Sender},
        Mutex,
    },
};
use tokio_util::codec::Decoder;

// Everything one control loop needs to serve one client.
#[derive(Debug)]
pub struct Config<Storage, User>
where
    Storage: StorageBackend<User>,
    User: UserDetail,
{
    pub storage: Arc<Storage>,
    pub greeting: &'static str,
    pub authenticator: Arc<dyn Authenticator<User>>,
    pub passive_ports: RangeInclusive<u16>,
    pub mode: ServerMode,
    pub idle_session_timeout: Duration,
    pub logger: slog::Logger,
}

impl<Storage, User> Clone for Config<Storage, User>
where
    Storage: StorageBackend<User>,
    User: UserDetail,
{
    fn clone(&self) -> Self {
        Config {
            storage: self.storage.clone(),
            greeting: self.greeting,
            authenticator: self.authenticator.clone(),
            passive_ports: self.passive_ports.clone(),
            mode: self.mode,
            idle_session_timeout: self.idle_session_timeout,
            logger: self.logger.clone(),
        }
    }
}

/// Performs the control channel processing for one connected client:
/// greets it and then spawns the command/reply loop.
pub async fn spawn_loop<Storage, User>(config: Config<Storage, User>, tcp_stream: TcpStream, mut shutdown: shutdown::Listener) -> Result<(), ControlChanError>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    let Config {
        storage,
        greeting,
        authenticator,
        passive_ports,
        mode,
        idle_session_timeout,
        logger,
    } = config;

    let source = tcp_stream.peer_addr()?;
    let local_addr = tcp_stream.local_addr()?;

    let (control_msg_tx, mut control_msg_rx): (Sender<ControlChanMsg>, Receiver<ControlChanMsg>) = channel(8);
    let session: Session<Storage, User> = Session::new(storage, source).control_msg_tx(control_msg_tx.clone());
    let logger = logger.new(slog::o!("trace-id" => format!("{}", session.trace_id), "source" => format!("{}", source)));
    let shared_session: SharedSession<Storage, User> = Arc::new(Mutex::new(session));

    let event_chain = PrimaryEventHandler {
        logger: logger.clone(),
        session: shared_session.clone(),
        authenticator,
        passive_ports,
        mode,
        tx_control_chan: control_msg_tx,
        local_addr,
    };

    let event_chain = AuthMiddleware {
        session: shared_session.clone(),
        next: event_chain,
    };

    let mut event_chain = LoggingMiddleware {
        logger: logger.clone(),
        sequence_nr: 0,
        next: event_chain,
    };

    let codec = FtpCodec::new();
    let (mut reply_sink, mut command_source) = codec.framed(tcp_stream).split();

    reply_sink.send(Reply::new(ReplyCode::ServiceReady, greeting)).await?;
    reply_sink.flush().await?;

    tokio::spawn(async move {
        slog::info!(logger, "Starting control loop");
        loop {
            let incoming = {
                let mut timeout_delay = Box::pin(tokio::time::sleep(idle_session_timeout));
                tokio::select! {
                    cmd_result = command_source.next() => {
                        match cmd_result {
                            None => {
                                slog::info!(logger, "Control connection closed by peer");
                                return;
                            }
                            Some(Err(e)) => {
                                // An I/O failure on the control channel ends
                                // the session without a goodbye.
                                slog::warn!(logger, "Control channel read error: {:?}", e);
                                return;
                            }
                            Some(Ok(Ok(cmd))) => Some(Ok(Event::Command(cmd))),
                            Some(Ok(Err(e))) => Some(Err(e)),
                        }
                    },
                    Some(msg) = control_msg_rx.recv() => {
                        Some(Ok(Event::InternalMsg(msg)))
                    },
                    _ = &mut timeout_delay => {
                        let session = shared_session.lock().await;
                        match session.data_busy {
                            true => None,
                            false => Some(Err(ControlChanError::new(ControlChanErrorKind::ControlChannelTimeout))),
                        }
                    },
                    _ = shutdown.listen() => {
                        slog::info!(logger, "Shutting down control loop");
                        let _ = reply_sink
                            .send(Reply::new(ReplyCode::ServiceNotAvailable, "Service not available, closing control connection"))
                            .await;
                        return;
                    }
                }
            };
            match incoming {
                None => {} // Data transfer in progress, reset the idle timer.
                Some(Ok(Event::InternalMsg(ControlChanMsg::ExitControlLoop))) => {
                    slog::info!(logger, "Exiting control loop");
                    return;
                }
                Some(Ok(event)) => match event_chain.handle(event).await {
                    Err(e) => {
                        slog::warn!(logger, "Event handler chain error: {:?}. Closing control connection", e);
                        return;
                    }
                    Ok(reply) => {
                        if reply_sink.send(reply).await.is_err() {
                            slog::warn!(logger, "Could not send reply to client");
                            return;
                        }
                    }
                },
                Some(Err(e)) => {
                    let (reply, close_connection) = handle_control_channel_error(&logger, e);
                    match reply {
                        // An idle timeout or i/o failure ends the session
                        // without a goodbye.
                        None => return,
                        Some(reply) => {
                            if reply_sink.send(reply).await.is_err() {
                                slog::warn!(logger, "Could not send error reply to client");
                                return;
                            }
                        }
                    }
                    if close_connection {
                        return;
                    }
                }
            }
        }
    });

    Ok(())
}

// Picks the reply (if any) for a control channel error and tells if the
// connection should be closed afterwards.
fn handle_control_channel_error(logger: &slog::Logger, error: ControlChanError) -> (Option<Reply>, bool) {
    slog::warn!(logger, "Control channel error: {:?}", error);
    match error.kind() {
        ControlChanErrorKind::UnknownCommand { .. } => (Some(Reply::new(ReplyCode::CommandSyntaxError, "Syntax error, command unrecognized")), false),
        ControlChanErrorKind::InvalidCommand => (Some(Reply::new(ReplyCode::ParameterSyntaxError, "Syntax error in parameters")), false),
        ControlChanErrorKind::LineTooLong => (Some(Reply::new(ReplyCode::CommandSyntaxError, "Syntax error, command line too long")), false),
        ControlChanErrorKind::Utf8Error => (Some(Reply::new(ReplyCode::CommandSyntaxError, "Invalid UTF8 in command")), false),
        ControlChanErrorKind::ControlChannelTimeout => (None, true),
        _ => (None, true),
    }
}

#[derive(Debug)]
struct PrimaryEventHandler<Storage, User>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    logger: slog::Logger,
    session: SharedSession<Storage, User>,
    authenticator: Arc<dyn Authenticator<User>>,
    passive_ports: RangeInclusive<u16>,
    mode: ServerMode,
    tx_control_chan: Sender<ControlChanMsg>,
    local_addr: SocketAddr,
}

impl<Storage, User> PrimaryEventHandler<Storage, User>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle_internal_msg(&self, msg: ControlChanMsg) -> Result<Reply, ControlChanError> {
        use ControlChanMsg::*;

        match msg {
            SentData { .. } => {
                let mut session = self.session.lock().await;
                session.start_pos = 0;
                Ok(Reply::new(ReplyCode::ClosingDataConnection, "Transfer complete"))
            }
            WrittenData { .. } => {
                let mut session = self.session.lock().await;
                session.start_pos = 0;
                Ok(Reply::new(ReplyCode::ClosingDataConnection, "Transfer complete"))
            }
            DirectoryListed => Ok(Reply::new(ReplyCode::ClosingDataConnection, "Transfer complete")),
            ConnectionReset => Ok(Reply::new(ReplyCode::ConnectionClosed, "Connection closed; transfer aborted")),
            TransferAborted => Ok(Reply::new(ReplyCode::ClosingDataConnection, "Closing data connection")),
            DelFileSuccess => Ok(Reply::new(ReplyCode::FileActionOkay, "File deleted")),
            RmDirSuccess => Ok(Reply::new(ReplyCode::FileActionOkay, "Directory deleted")),
            MkDirSuccess { path } => Ok(Reply::new_with_string(ReplyCode::PathCreated, format!("\"{}\" created", path))),
            RenameSuccess => Ok(Reply::new(ReplyCode::FileActionOkay, "Rename successful")),
            StorageError(error) => Ok(storage_error_reply(&error)),
            CommandChannelReply(reply) => Ok(reply),
            // ExitControlLoop is caught by the loop before we get here.
            ExitControlLoop => Ok(Reply::none()),
        }
    }

    async fn handle_command(&self, cmd: Command) -> Result<Reply, ControlChanError> {
        // Two-step sequences: RNFR/RNTO and REST/{RETR,STOR,APPE}. Any
        // intervening command cancels the pending half.
        {
            let mut session = self.session.lock().await;
            if session.rename_from.is_some() && !matches!(cmd, Command::Rnto { .. }) {
                session.rename_from = None;
            }
            if session.start_pos > 0 && !matches!(cmd, Command::Retr { .. } | Command::Stor { .. } | Command::Appe { .. } | Command::Rest { .. }) {
                session.start_pos = 0;
            }
        }

        let args = CommandContext {
            session: self.session.clone(),
            authenticator: self.authenticator.clone(),
            passive_ports: self.passive_ports.clone(),
            mode: self.mode,
            tx_control_chan: self.tx_control_chan.clone(),
            local_addr: self.local_addr,
            logger: self.logger.clone(),
        };

        let handler: Box<dyn CommandHandler<Storage, User>> = match cmd {
            Command::User { username } => Box::new(commands::User::new(username)),
            Command::Pass { password } => Box::new(commands::Pass::new(password)),
            Command::Syst => Box::new(commands::Syst),
            Command::Stat { path } => Box::new(commands::Stat::new(path)),
            Command::Feat => Box::new(commands::Feat),
            Command::Help => Box::new(commands::Help),
            Command::Noop => Box::new(commands::Noop),
            Command::Quit => Box::new(commands::Quit),
            Command::Type { param } => Box::new(commands::Type::new(param)),
            Command::Stru { structure } => Box::new(commands::Stru::new(structure)),
            Command::Mode { mode } => Box::new(commands::Mode::new(mode)),
            Command::Pasv => Box::new(commands::Pasv),
            Command::Epsv => Box::new(commands::Epsv),
            Command::Port { addr } => Box::new(commands::Port::new(addr)),
            Command::Eprt { addr } => Box::new(commands::Eprt::new(addr)),
            Command::Retr { path } => Box::new(commands::Retr::new(path)),
            Command::Stor { path } => Box::new(commands::Stor::new(path)),
            Command::Appe { path } => Box::new(commands::Appe::new(path)),
            Command::List { path } => Box::new(commands::List::new(path)),
            Command::Nlst { path } => Box::new(commands::Nlst::new(path)),
            Command::Pwd => Box::new(commands::Pwd),
            Command::Cwd { path } => Box::new(commands::Cwd::new(path)),
            Command::Cdup => Box::new(commands::Cdup),
            Command::Dele { path } => Box::new(commands::Dele::new(path)),
            Command::Rmd { path } => Box::new(commands::Rmd::new(path)),
            Command::Mkd { path } => Box::new(commands::Mkd::new(path)),
            Command::Rnfr { path } => Box::new(commands::Rnfr::new(path)),
            Command::Rnto { path } => Box::new(commands::Rnto::new(path)),
            Command::Size { path } => Box::new(commands::Size::new(path)),
            Command::Mdtm { path } => Box::new(commands::Mdtm::new(path)),
            Command::Rest { offset } => Box::new(commands::Rest::new(offset)),
            Command::Abor => Box::new(commands::Abor),
            Command::Allo => Box::new(commands::Allo),
            Command::Opts { option } => Box::new(commands::Opts::new(option)),
        };

        handler.handle(args).await
    }
}

#[async_trait::async_trait]
impl<Storage, User> ControlChanMiddleware for PrimaryEventHandler<Storage, User>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&mut self, event: Event) -> Result<Reply, ControlChanError> {
        match event {
            Event::Command(cmd) => self.handle_command(cmd).await,
            Event::InternalMsg(msg) => self.handle_internal_msg(msg).await,
        }
    }
}

// Maps a storage error onto the FTP reply the client should see.
pub(crate) fn storage_error_reply(error: &crate::storage::Error) -> Reply {
    match error.kind() {
        ErrorKind::PermanentFileNotAvailable => Reply::new(ReplyCode::FileError, "File not found"),
        ErrorKind::AlreadyExists => Reply::new(ReplyCode::FileError, "Directory exists"),
        ErrorKind::PermissionDenied => Reply::new(ReplyCode::FileError, "Permission denied"),
        ErrorKind::TransientFileNotAvailable => Reply::new(ReplyCode::TransientFileError, "Requested file action not taken"),
        ErrorKind::LocalError => Reply::new(ReplyCode::LocalError, "Requested action aborted: local error"),
    }
}
