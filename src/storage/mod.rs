//! Contains the service provider interface for storage back-ends along
//! with the built-in [`Filesystem`] back-end that serves a directory on
//! local disk.
//!
//! All paths crossing this interface are *virtual* paths: absolute,
//! normalized, POSIX-style paths rooted at `/`. See [`path::resolve`].

mod error;
mod filesystem;
pub mod path;
mod storage_backend;

pub use error::{Error, ErrorKind};
pub use filesystem::{Filesystem, Meta};
pub use storage_backend::{Fileinfo, Metadata, Result, StorageBackend};
