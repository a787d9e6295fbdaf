//! The session module implements per-connection session state.

use super::chancomms::{ControlChanMsg, DataChanCmd};
use crate::{
    auth::UserDetail,
    storage::{Metadata, StorageBackend},
};
use std::{
    fmt::{Debug, Formatter},
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
};
use tokio::sync::mpsc::{Receiver, Sender};

// TraceId is an identifier used to correlate log statements of one session.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct TraceId(u64);

impl TraceId {
    pub fn new() -> Self {
        let mut bytes = [0u8; 8];
        // A failing system RNG leaves the id at zero, which only hurts
        // log correlation.
        let _ = getrandom::fill(&mut bytes);
        TraceId(u64::from_ne_bytes(bytes))
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

// The state of a session with respect to authentication.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum SessionState {
    // Connected, no username given yet.
    New,
    // USER was accepted, PASS outstanding.
    WaitPass,
    // Authenticated, commands are served.
    WaitCmd,
}

// The transfer TYPE negotiated with the client.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TransferType {
    // Line endings are rewritten to CRLF on the wire.
    Ascii,
    // Byte-exact.
    Image,
}

// The session shared between the control loop and the data channel task.
pub type SharedSession<S, U> = Arc<tokio::sync::Mutex<Session<S, U>>>;

// This is where we keep the state of one FTP session.
pub struct Session<Storage, User>
where
    Storage: StorageBackend<User>,
    Storage::Metadata: Metadata,
    User: UserDetail,
{
    pub trace_id: TraceId,
    // Detail about the authenticated user. None until PASS succeeded.
    pub user: Arc<Option<User>>,
    // The username given with USER. Not yet validated by PASS.
    pub username: Option<String>,
    pub storage: Arc<Storage>,
    // Address of the client's end of the control connection.
    pub source: SocketAddr,
    pub state: SessionState,
    // Current working directory: a normalized virtual path.
    pub cwd: PathBuf,
    pub transfer_type: TransferType,
    // The control loop uses this to hand a transfer command to the data
    // channel task. Installed by PASV/EPSV/PORT/EPRT, consumed by one
    // transfer: a fresh endpoint is needed per transfer.
    pub data_cmd_tx: Option<Sender<DataChanCmd>>,
    pub data_cmd_rx: Option<Receiver<DataChanCmd>>,
    // The control loop uses this to ask the data channel task to stop.
    pub data_abort_tx: Option<Sender<()>>,
    pub data_abort_rx: Option<Receiver<()>>,
    // The data channel task reports back to the control loop over this.
    pub control_msg_tx: Option<Sender<ControlChanMsg>>,
    // True while a transfer is running. Suppresses the idle timeout and
    // steers ABOR.
    pub data_busy: bool,
    // The restart offset for the next RETR/STOR, set by REST.
    pub start_pos: u64,
    // After RNFR this holds the rename source until RNTO consumes it.
    pub rename_from: Option<PathBuf>,
}

impl<Storage, User> Session<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
    User: UserDetail + 'static,
{
    pub(super) fn new(storage: Arc<Storage>, source: SocketAddr) -> Self {
        Session {
            trace_id: TraceId::new(),
            user: Arc::new(None),
            username: None,
            storage,
            source,
            state: SessionState::New,
            cwd: "/".into(),
            transfer_type: TransferType::Ascii,
            data_cmd_tx: None,
            data_cmd_rx: None,
            data_abort_tx: None,
            data_abort_rx: None,
            control_msg_tx: None,
            data_busy: false,
            start_pos: 0,
            rename_from: None,
        }
    }

    pub fn control_msg_tx(mut self, sender: Sender<ControlChanMsg>) -> Self {
        self.control_msg_tx = Some(sender);
        self
    }
}

impl<Storage, User> Debug for Session<Storage, User>
where
    Storage: StorageBackend<User>,
    Storage::Metadata: Metadata,
    User: UserDetail,
{
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("trace_id", &self.trace_id)
            .field("source", &self.source)
            .field("state", &self.state)
            .field("cwd", &self.cwd)
            .field("transfer_type", &self.transfer_type)
            .field("data_busy", &self.data_busy)
            .field("start_pos", &self.start_pos)
            .field("rename_from", &self.rename_from)
            .finish()
    }
}
