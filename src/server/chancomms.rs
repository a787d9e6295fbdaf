//! Contains the messages exchanged between the control loop and the data
//! channel task of one session.

use crate::server::controlchan::Reply;
use crate::storage;
use std::fmt;
use std::path::PathBuf;

// A transfer command handed to the data channel task. Paths are already
// resolved virtual paths.
#[derive(PartialEq, Eq, Debug)]
pub enum DataChanCmd {
    Retr { path: PathBuf },
    Stor { path: PathBuf },
    Appe { path: PathBuf },
    List { path: PathBuf },
    Nlst { path: PathBuf },
}

/// Messages sent to the control loop, mostly reporting the outcome of
/// work that happened outside of it.
#[derive(Debug)]
pub enum ControlChanMsg {
    /// Data was successfully sent to the client during a RETR
    SentData {
        /// The number of bytes transferred
        bytes: u64,
    },
    /// We've written the data from the client to the storage back-end
    WrittenData {
        /// The number of bytes transferred
        bytes: u64,
    },
    /// Listed the directory successfully
    DirectoryListed,
    /// The data connection broke mid-transfer
    ConnectionReset,
    /// A running transfer was cancelled through ABOR
    TransferAborted,
    /// File successfully deleted
    DelFileSuccess,
    /// Directory successfully removed
    RmDirSuccess,
    /// Directory successfully created
    MkDirSuccess {
        /// The path as given by the client, echoed in the reply
        path: String,
    },
    /// An RNFR/RNTO pair completed
    RenameSuccess,
    /// An error from the storage back-end
    StorageError(storage::Error),
    /// A fully formed reply that just needs to go out
    CommandChannelReply(Reply),
    /// Quit the client connection
    ExitControlLoop,
}

impl fmt::Display for ControlChanMsg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
