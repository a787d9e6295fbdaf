//! Contains code pertaining to the FTP *data* channel

use super::chancomms::{ControlChanMsg, DataChanCmd};
use crate::server::io::{CrlfToLfReader, LfToCrlfReader};
use crate::server::session::{SharedSession, TransferType};
use crate::{
    auth::UserDetail,
    storage::{Metadata, StorageBackend},
};
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc::Sender;

// How long an established endpoint waits for a transfer command before
// it is discarded.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5 * 60);

// Where the bytes of a transfer will flow. Passive endpoints already
// accepted the client's connection; active endpoints dial the client the
// moment the transfer command arrives.
#[derive(Debug)]
pub enum DataConnect {
    Accepted(TcpStream),
    Dial(SocketAddr),
}

// Runs exactly one transfer over an established data endpoint.
#[derive(Debug)]
pub struct DataCommandExecutor<Storage, User>
where
    Storage: StorageBackend<User>,
    Storage::Metadata: Metadata,
    User: UserDetail,
{
    pub user: Arc<Option<User>>,
    pub socket: TcpStream,
    pub control_msg_tx: Sender<ControlChanMsg>,
    pub storage: Arc<Storage>,
    pub transfer_type: TransferType,
    pub start_pos: u64,
    pub logger: slog::Logger,
}

impl<Storage, User> DataCommandExecutor<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
    User: UserDetail + 'static,
{
    pub async fn execute(self, cmd: DataChanCmd) {
        match cmd {
            DataChanCmd::Retr { path } => self.exec_retr(path).await,
            DataChanCmd::Stor { path } => self.exec_stor(path, false).await,
            DataChanCmd::Appe { path } => self.exec_stor(path, true).await,
            DataChanCmd::List { path } => self.exec_list(path).await,
            DataChanCmd::Nlst { path } => self.exec_nlst(path).await,
        }
    }

    async fn exec_retr(self, path: PathBuf) {
        let Some(user) = (*self.user).as_ref() else {
            slog::error!(self.logger, "Transfer attempted without authenticated user. Aborting data loop");
            return;
        };
        let tx = self.control_msg_tx.clone();
        let mut socket = self.socket;
        match self.storage.get(user, &path, self.start_pos).await {
            Ok(mut reader) => {
                let copy_result = match self.transfer_type {
                    TransferType::Image => tokio::io::copy(&mut reader, &mut socket).await,
                    TransferType::Ascii => {
                        let mut reader = LfToCrlfReader::new(reader);
                        tokio::io::copy(&mut reader, &mut socket).await
                    }
                };
                match copy_result {
                    Ok(bytes) => {
                        if let Err(err) = socket.shutdown().await {
                            slog::warn!(self.logger, "Could not shutdown data socket after RETR: {}", err);
                        }
                        Self::notify(&self.logger, &tx, ControlChanMsg::SentData { bytes }).await;
                    }
                    Err(err) => {
                        slog::warn!(self.logger, "Error copying to data channel during RETR: {}", err);
                        Self::notify(&self.logger, &tx, ControlChanMsg::ConnectionReset).await;
                    }
                }
            }
            Err(err) => Self::notify(&self.logger, &tx, ControlChanMsg::StorageError(err)).await,
        }
    }

    async fn exec_stor(self, path: PathBuf, append: bool) {
        let Some(user) = (*self.user).as_ref() else {
            slog::error!(self.logger, "Transfer attempted without authenticated user. Aborting data loop");
            return;
        };
        let tx = self.control_msg_tx.clone();
        let reader: Box<dyn tokio::io::AsyncRead + Send + Sync + Unpin> = match self.transfer_type {
            TransferType::Image => Box::new(self.socket),
            TransferType::Ascii => Box::new(CrlfToLfReader::new(self.socket)),
        };
        let start_pos = if append { 0 } else { self.start_pos };
        match self.storage.put(user, reader, &path, start_pos, append).await {
            Ok(bytes) => Self::notify(&self.logger, &tx, ControlChanMsg::WrittenData { bytes }).await,
            Err(err) => Self::notify(&self.logger, &tx, ControlChanMsg::StorageError(err)).await,
        }
    }

    async fn exec_list(self, path: PathBuf) {
        let Some(user) = (*self.user).as_ref() else {
            slog::error!(self.logger, "Transfer attempted without authenticated user. Aborting data loop");
            return;
        };
        let tx = self.control_msg_tx.clone();
        let mut socket = self.socket;
        match self.storage.list_fmt(user, &path).await {
            Ok(mut cursor) => match tokio::io::copy(&mut cursor, &mut socket).await {
                Ok(_) => {
                    if let Err(err) = socket.shutdown().await {
                        slog::warn!(self.logger, "Could not shutdown data socket after LIST: {}", err);
                    }
                    Self::notify(&self.logger, &tx, ControlChanMsg::DirectoryListed).await;
                }
                Err(err) => {
                    slog::warn!(self.logger, "Error copying to data channel during LIST: {}", err);
                    Self::notify(&self.logger, &tx, ControlChanMsg::ConnectionReset).await;
                }
            },
            Err(err) => Self::notify(&self.logger, &tx, ControlChanMsg::StorageError(err)).await,
        }
    }

    async fn exec_nlst(self, path: PathBuf) {
        let Some(user) = (*self.user).as_ref() else {
            slog::error!(self.logger, "Transfer attempted without authenticated user. Aborting data loop");
            return;
        };
        let tx = self.control_msg_tx.clone();
        let mut socket = self.socket;
        match self.storage.nlst(user, &path).await {
            Ok(mut cursor) => match tokio::io::copy(&mut cursor, &mut socket).await {
                Ok(_) => {
                    if let Err(err) = socket.shutdown().await {
                        slog::warn!(self.logger, "Could not shutdown data socket after NLST: {}", err);
                    }
                    Self::notify(&self.logger, &tx, ControlChanMsg::DirectoryListed).await;
                }
                Err(err) => {
                    slog::warn!(self.logger, "Error copying to data channel during NLST: {}", err);
                    Self::notify(&self.logger, &tx, ControlChanMsg::ConnectionReset).await;
                }
            },
            Err(err) => Self::notify(&self.logger, &tx, ControlChanMsg::StorageError(err)).await,
        }
    }

    async fn notify(logger: &slog::Logger, tx: &Sender<ControlChanMsg>, msg: ControlChanMsg) {
        if let Err(err) = tx.send(msg).await {
            slog::error!(logger, "Could not notify control channel: {}", err);
        }
    }
}

/// Watches an established data endpoint: waits for the one transfer
/// command this endpoint will serve, runs it, and tears the endpoint
/// down afterwards. ABOR cancels a pending endpoint silently and a
/// running transfer with a confirmation to the control loop.
pub async fn spawn_processing<Storage, User>(logger: slog::Logger, session_arc: SharedSession<Storage, User>, target: DataConnect)
where
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
    User: UserDetail + 'static,
{
    // Copy out what the transfer needs and release the lock before any
    // of the slow work starts.
    let (control_msg_tx, mut data_cmd_rx, mut data_abort_rx, storage, user) = {
        let mut session = session_arc.lock().await;
        let control_msg_tx = match session.control_msg_tx {
            Some(ref tx) => tx.clone(),
            None => {
                slog::error!(logger, "Control loop message sender expected to be set up. Aborting data loop");
                return;
            }
        };
        let Some(data_cmd_rx) = session.data_cmd_rx.take() else {
            slog::error!(logger, "Data loop command receiver expected to be set up. Aborting data loop");
            return;
        };
        let Some(data_abort_rx) = session.data_abort_rx.take() else {
            slog::error!(logger, "Data loop abort receiver expected to be set up. Aborting data loop");
            return;
        };
        (control_msg_tx, data_cmd_rx, data_abort_rx, Arc::clone(&session.storage), session.user.clone())
    };

    tokio::spawn(async move {
        tokio::select! {
            Some(cmd) = data_cmd_rx.recv() => {
                // The transfer parameters can still change between
                // endpoint setup and the transfer command (TYPE, REST),
                // so they are sampled here.
                let (transfer_type, start_pos) = {
                    let mut session = session_arc.lock().await;
                    session.data_busy = true;
                    (session.transfer_type, session.start_pos)
                };
                let socket = match target {
                    DataConnect::Accepted(socket) => Ok(socket),
                    DataConnect::Dial(addr) => TcpStream::connect(addr).await,
                };
                match socket {
                    Ok(socket) => {
                        let executor = DataCommandExecutor {
                            user,
                            socket,
                            control_msg_tx: control_msg_tx.clone(),
                            storage,
                            transfer_type,
                            start_pos,
                            logger: logger.clone(),
                        };
                        tokio::select! {
                            _ = executor.execute(cmd) => {}
                            Some(_) = data_abort_rx.recv() => {
                                // Dropping the executor future closed the
                                // data socket.
                                slog::info!(logger, "Transfer aborted on client request");
                                if control_msg_tx.send(ControlChanMsg::TransferAborted).await.is_err() {
                                    slog::warn!(logger, "Could not notify control channel of aborted transfer");
                                }
                            }
                        }
                    }
                    Err(err) => {
                        slog::warn!(logger, "Could not open data connection to client: {}", err);
                        if control_msg_tx.send(ControlChanMsg::ConnectionReset).await.is_err() {
                            slog::warn!(logger, "Could not notify control channel of failed data connection");
                        }
                    }
                }
                let mut session = session_arc.lock().await;
                session.data_busy = false;
                session.data_abort_tx = None;
            }
            Some(_) = data_abort_rx.recv() => {
                slog::info!(logger, "Data endpoint discarded before use");
            }
            _ = tokio::time::sleep(COMMAND_TIMEOUT) => {
                slog::warn!(logger, "Data endpoint timed out waiting for a transfer command");
            }
        }
    });
}
