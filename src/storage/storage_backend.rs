//! Defines the service provider interface for storage back-end implementors.

use super::error::Error;
use crate::auth::UserDetail;
use async_trait::async_trait;
use chrono::prelude::{DateTime, Utc};
use std::{
    fmt::{self, Debug, Formatter},
    path::Path,
    result,
    time::SystemTime,
};

/// Result type used by traits in this module
pub type Result<T> = result::Result<T, Error>;

/// Represents the metadata of a file or directory as seen by FTP clients
pub trait Metadata {
    /// Returns the length (size) of the file in bytes.
    fn len(&self) -> u64;

    /// Returns `self.len() == 0`.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the path is a directory.
    fn is_dir(&self) -> bool;

    /// Returns true if the path is a file.
    fn is_file(&self) -> bool;

    /// Returns the last modified time of the path.
    fn modified(&self) -> Result<SystemTime>;
}

/// Fileinfo contains the path and [`Metadata`] of a file or directory.
///
/// Its `Display` implementation renders the single listing line standard
/// clients parse: a UNIX `ls -l` style line with fixed link count, owner
/// and group, and an English `Mon dd HH:MM` timestamp regardless of host
/// locale.
///
/// [`Metadata`]: ./trait.Metadata.html
#[derive(Clone)]
pub struct Fileinfo<P, M>
where
    P: AsRef<Path>,
    M: Metadata,
{
    /// The path of the entry, relative to the listed directory
    pub path: P,
    /// The entry's metadata
    pub metadata: M,
}

impl<P, M> fmt::Display for Fileinfo<P, M>
where
    P: AsRef<Path>,
    M: Metadata,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let modified: String = self
            .metadata
            .modified()
            .map(|x| DateTime::<Utc>::from(x).format("%b %d %H:%M").to_string())
            .unwrap_or_else(|_| "Jan 01 00:00".to_string());
        let basename = self.path.as_ref().components().next_back();
        let name = match basename {
            Some(v) => v.as_os_str().to_string_lossy(),
            None => return Err(fmt::Error),
        };
        let (perms, size) = if self.metadata.is_dir() {
            ("drwxr-xr-x", 0)
        } else {
            ("-rw-r--r--", self.metadata.len())
        };
        write!(f, "{} 1 ftp ftp {} {} {}", perms, size, modified, name)
    }
}

/// The `StorageBackend` trait defines a common interface to different
/// storage back-ends for the FTP server, e.g. for a filesystem back-end.
/// All paths are virtual paths: absolute, normalized and POSIX-style.
///
/// Write operations need only per-path atomicity; the server never issues
/// overlapping operations for one session, and conflicting writes from
/// different sessions are last-writer-wins.
#[async_trait]
pub trait StorageBackend<User: UserDetail>: Send + Sync + Debug {
    /// The concrete type of the _metadata_ used by this storage backend.
    type Metadata: Metadata + Sync + Send;

    /// Returns the `Metadata` for the given file.
    ///
    /// [`Metadata`]: ./trait.Metadata.html
    async fn metadata<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<Self::Metadata>;

    /// Returns the list of files in the given directory.
    async fn list<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<Vec<Fileinfo<std::path::PathBuf, Self::Metadata>>>
    where
        <Self as StorageBackend<User>>::Metadata: Metadata;

    /// Returns some bytes that make up a directory listing that can
    /// immediately be sent to the client over the data channel.
    async fn list_fmt<P>(&self, user: &User, path: P) -> Result<std::io::Cursor<Vec<u8>>>
    where
        P: AsRef<Path> + Send + Debug,
        Self::Metadata: Metadata + 'static,
    {
        let list = self.list(user, path).await?;

        let lines: Vec<u8> = list.iter().map(|fi| format!("{}\r\n", fi)).collect::<String>().into_bytes();

        Ok(std::io::Cursor::new(lines))
    }

    /// Returns some bytes that make up a NLST directory listing (only the
    /// bare names) that can immediately be sent to the client.
    async fn nlst<P>(&self, user: &User, path: P) -> Result<std::io::Cursor<Vec<u8>>>
    where
        P: AsRef<Path> + Send + Debug,
        Self::Metadata: Metadata + 'static,
    {
        let list = self.list(user, path).await?;

        let bytes = list
            .iter()
            .map(|fi| {
                let name = fi.path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("")).to_string_lossy();
                format!("{}\r\n", name)
            })
            .collect::<String>()
            .into_bytes();
        Ok(std::io::Cursor::new(bytes))
    }

    /// Returns the content of the given file from offset `start_pos`,
    /// ready to be copied to the data channel.
    async fn get<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P, start_pos: u64) -> Result<Box<dyn tokio::io::AsyncRead + Send + Sync + Unpin>>;

    /// Writes bytes from the given reader to the specified path. With
    /// `append` set the bytes go to the end of any existing file,
    /// otherwise the file is (re)created and writing starts at offset
    /// `start_pos`.
    async fn put<P: AsRef<Path> + Send + Debug, R: tokio::io::AsyncRead + Send + Sync + Unpin + 'static>(
        &self,
        user: &User,
        input: R,
        path: P,
        start_pos: u64,
        append: bool,
    ) -> Result<u64>;

    /// Deletes the file at the given path. Directories are refused.
    async fn del<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<()>;

    /// Creates the given directory.
    async fn mkd<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<()>;

    /// Renames the given file or directory to the given new name.
    async fn rename<P: AsRef<Path> + Send + Debug>(&self, user: &User, from: P, to: P) -> Result<()>;

    /// Deletes the given directory. Non-empty directories are refused.
    async fn rmd<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, UNIX_EPOCH};

    struct FakeMeta {
        len: u64,
        dir: bool,
        modified: SystemTime,
    }

    impl Metadata for FakeMeta {
        fn len(&self) -> u64 {
            self.len
        }
        fn is_dir(&self) -> bool {
            self.dir
        }
        fn is_file(&self) -> bool {
            !self.dir
        }
        fn modified(&self) -> Result<SystemTime> {
            Ok(self.modified)
        }
    }

    // 2021-01-05 14:23:00 UTC
    const STAMP: u64 = 1_609_856_580;

    #[test]
    fn file_line_format() {
        let fi = Fileinfo {
            path: std::path::PathBuf::from("test_file.txt"),
            metadata: FakeMeta {
                len: 11,
                dir: false,
                modified: UNIX_EPOCH + Duration::from_secs(STAMP),
            },
        };
        assert_eq!(format!("{}", fi), "-rw-r--r-- 1 ftp ftp 11 Jan 05 14:23 test_file.txt");
    }

    #[test]
    fn directory_line_format() {
        let fi = Fileinfo {
            path: std::path::PathBuf::from("test_dir"),
            metadata: FakeMeta {
                len: 4096,
                dir: true,
                modified: UNIX_EPOCH + Duration::from_secs(STAMP),
            },
        };
        assert_eq!(format!("{}", fi), "drwxr-xr-x 1 ftp ftp 0 Jan 05 14:23 test_dir");
    }
}
