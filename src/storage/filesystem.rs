//! A [`StorageBackend`] that serves a directory on local disk, like a
//! traditional FTP server.

use super::error::{Error, ErrorKind};
use super::storage_backend::{Fileinfo, Metadata, Result, StorageBackend};
use crate::auth::UserDetail;
use async_trait::async_trait;
use std::{
    fmt::Debug,
    io,
    path::{Path, PathBuf},
    time::SystemTime,
};
use tokio::io::AsyncSeekExt;

/// The Filesystem struct is an implementation of the [`StorageBackend`]
/// trait that keeps its files inside a specific root directory on local
/// disk. Clients can never reach anything outside of that root: the
/// server hands this back-end virtual paths that are already normalized,
/// so prefixing them with the root is all that is needed.
#[derive(Debug)]
pub struct Filesystem {
    root: PathBuf,
}

/// Metadata for the filesystem back-end
#[derive(Debug)]
pub struct Meta {
    inner: std::fs::Metadata,
}

impl Filesystem {
    /// Create a new Filesystem back-end with the given root. For example,
    /// when the root is set to `/srv/ftp` and a client asks for
    /// `/hello.txt`, the server will send it `/srv/ftp/hello.txt`.
    pub fn new<P: Into<PathBuf>>(root: P) -> io::Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(io::Error::new(io::ErrorKind::NotFound, format!("{:?} is not a directory", root)));
        }
        Ok(Filesystem { root })
    }

    // Maps a normalized virtual path onto the real path under the root.
    // Virtual paths are normalized before they get here, so the result
    // cannot escape the root.
    fn real_path<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let relative = path.as_ref().strip_prefix("/").unwrap_or_else(|_| path.as_ref());
        let full = self.root.join(relative);
        debug_assert!(full.starts_with(&self.root));
        full
    }
}

#[async_trait]
impl<User: UserDetail> StorageBackend<User> for Filesystem {
    type Metadata = Meta;

    async fn metadata<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P) -> Result<Self::Metadata> {
        let meta = tokio::fs::metadata(self.real_path(path)).await?;
        Ok(Meta { inner: meta })
    }

    async fn list<P>(&self, _user: &User, path: P) -> Result<Vec<Fileinfo<PathBuf, Self::Metadata>>>
    where
        P: AsRef<Path> + Send + Debug,
        <Self as StorageBackend<User>>::Metadata: Metadata,
    {
        let mut entries = tokio::fs::read_dir(self.real_path(path)).await?;
        let mut fis: Vec<Fileinfo<PathBuf, Self::Metadata>> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            fis.push(Fileinfo {
                path: entry.file_name().into(),
                metadata: Meta { inner: meta },
            });
        }
        fis.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(fis)
    }

    async fn get<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P, start_pos: u64) -> Result<Box<dyn tokio::io::AsyncRead + Send + Sync + Unpin>> {
        let full = self.real_path(path);
        // Opening a directory succeeds on some platforms and only fails
        // once reading starts, so refuse it here.
        if tokio::fs::metadata(&full).await?.is_dir() {
            return Err(Error::new(ErrorKind::PermanentFileNotAvailable, "not a regular file"));
        }
        let mut file = tokio::fs::File::open(full).await?;
        if start_pos > 0 {
            file.seek(io::SeekFrom::Start(start_pos)).await?;
        }
        Ok(Box::new(tokio::io::BufReader::with_capacity(4096, file)) as Box<dyn tokio::io::AsyncRead + Send + Sync + Unpin>)
    }

    async fn put<P: AsRef<Path> + Send + Debug, R: tokio::io::AsyncRead + Send + Sync + Unpin + 'static>(
        &self,
        _user: &User,
        input: R,
        path: P,
        start_pos: u64,
        append: bool,
    ) -> Result<u64> {
        let mut oo = tokio::fs::OpenOptions::new();
        if append {
            oo.append(true).create(true);
        } else {
            oo.write(true).create(true);
        }
        let mut file = oo.open(self.real_path(path)).await?;
        if !append {
            file.set_len(start_pos).await?;
            file.seek(io::SeekFrom::Start(start_pos)).await?;
        }

        let mut reader = tokio::io::BufReader::with_capacity(4096, input);
        let mut writer = tokio::io::BufWriter::with_capacity(4096, file);
        let bytes_copied = tokio::io::copy(&mut reader, &mut writer).await?;
        use tokio::io::AsyncWriteExt;
        writer.flush().await?;
        Ok(bytes_copied)
    }

    async fn del<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P) -> Result<()> {
        let real = self.real_path(&path);
        let meta = Meta { inner: tokio::fs::metadata(&real).await? };
        if meta.is_dir() {
            return Err(Error::new(ErrorKind::PermanentFileNotAvailable, "not a regular file"));
        }
        tokio::fs::remove_file(self.real_path(path)).await.map_err(Error::from)
    }

    async fn mkd<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P) -> Result<()> {
        tokio::fs::create_dir(self.real_path(path)).await.map_err(Error::from)
    }

    async fn rename<P: AsRef<Path> + Send + Debug>(&self, _user: &User, from: P, to: P) -> Result<()> {
        let from = self.real_path(from);
        let to = self.real_path(to);
        // Renaming something that does not exist must not create the target.
        tokio::fs::symlink_metadata(&from).await?;
        tokio::fs::rename(from, to).await.map_err(Error::from)
    }

    async fn rmd<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P) -> Result<()> {
        // remove_dir refuses non-empty directories.
        tokio::fs::remove_dir(self.real_path(path)).await.map_err(Error::from)
    }
}

impl Metadata for Meta {
    fn len(&self) -> u64 {
        self.inner.len()
    }

    fn is_dir(&self) -> bool {
        self.inner.is_dir()
    }

    fn is_file(&self) -> bool {
        self.inner.is_file()
    }

    fn modified(&self) -> Result<SystemTime> {
        self.inner.modified().map_err(|e| e.into())
    }
}
