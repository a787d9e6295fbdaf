#![deny(missing_docs)]
//! An FTP server library for Rust
//!
//! ironftp is an embeddable, async FTP server implementation (RFC 959 plus
//! the PASV/EPSV/PORT/EPRT/FEAT/SIZE/MDTM/REST extensions). It serves a
//! virtualized view of a host directory: clients see an absolute POSIX
//! tree rooted at `/` and can never escape the configured root.
//!
//! # Quick Start
//!
//! ```no_run
//! use ironftp::Server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::with_fs("/srv/ftp")
//!         .credentials("alice", "correct horse")
//!         .greeting("Welcome to my FTP server")
//!         .build()
//!         .unwrap();
//!
//!     server.listen("127.0.0.1:2121").await.unwrap();
//! }
//! ```

pub mod auth;
pub(crate) mod server;
pub mod storage;

pub use crate::server::ftpserver::{error::ServerError, options, Server, ServerBuilder, StopHandle};

// Error source boxed into the error types of this crate.
pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
