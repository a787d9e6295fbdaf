//! Contains the code that makes up the FTP server proper: the listener,
//! the per-connection session, and the control and data channels.

pub(crate) mod chancomms;
pub(crate) mod controlchan;
pub(crate) mod datachan;
pub(crate) mod ftpserver;
pub(crate) mod io;
pub(crate) mod password;
pub(crate) mod session;
pub(crate) mod shutdown;

pub(crate) use session::{Session, SessionState};
