//! One module per FTP verb. Each contains the [`CommandHandler`] that
//! serves it.
//!
//! [`CommandHandler`]: crate::server::controlchan::handler::CommandHandler

mod abor;
mod allo;
mod appe;
mod cdup;
mod cwd;
mod dele;
mod eprt;
mod epsv;
mod feat;
mod help;
mod list;
mod mdtm;
mod mkd;
mod mode;
mod nlst;
mod noop;
mod opts;
mod pass;
mod pasv;
mod port;
mod pwd;
mod quit;
mod rest;
mod retr;
mod rmd;
mod rnfr;
mod rnto;
mod size;
mod stat;
mod stor;
mod stru;
mod syst;
mod type_;
mod user;

mod active_common;
mod passive_common;

pub use abor::Abor;
pub use allo::Allo;
pub use appe::Appe;
pub use cdup::Cdup;
pub use cwd::Cwd;
pub use dele::Dele;
pub use eprt::Eprt;
pub use epsv::Epsv;
pub use feat::Feat;
pub use help::Help;
pub use list::List;
pub use mdtm::Mdtm;
pub use mkd::Mkd;
pub use mode::Mode;
pub use nlst::Nlst;
pub use noop::Noop;
pub use opts::Opts;
pub use pass::Pass;
pub use pasv::Pasv;
pub use port::Port;
pub use pwd::Pwd;
pub use quit::Quit;
pub use rest::Rest;
pub use retr::Retr;
pub use rmd::Rmd;
pub use rnfr::Rnfr;
pub use rnto::Rnto;
pub use size::Size;
pub use stat::Stat;
pub use stor::Stor;
pub use stru::Stru;
pub use syst::Syst;
pub use type_::Type;
pub use user::User;

/// The file structures of RFC 959 section 3.1.1. Only `File` is served.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StruParam {
    /// "Regular" file structure.
    File,
    /// Files are structured in "Records".
    Record,
    /// Files are structured in "Pages".
    Page,
}

/// The transmission modes of RFC 959 section 3.4. Only `Stream` is
/// served.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ModeParam {
    /// Data is sent in a continuous stream of bytes.
    Stream,
    /// Data is sent as a series of blocks preceded by one or more header bytes.
    Block,
    /// Some round of compression is applied to the data.
    Compressed,
}

/// An option the client can set through OPTS.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Opt {
    /// The UTF-8 option of RFC 2640. Paths are exchanged as UTF-8 either
    /// way, so this is an acknowledgement, not a switch.
    Utf8 {
        /// Turn it on or off
        on: bool,
    },
}
