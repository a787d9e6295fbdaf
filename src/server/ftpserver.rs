//! Contains the [`Server`] type, the public face of the library, and its
//! builder.

pub mod error;
pub(crate) mod listener;
pub mod options;

use crate::{
    auth::{Authenticator, DefaultUser, StaticAuthenticator, UserDetail},
    server::{controlchan::control_loop, shutdown},
    storage::{Filesystem, Metadata, StorageBackend},
};
use error::ServerError;
use options::ServerMode;
use slog::Drain;
use std::{io, ops::RangeInclusive, path::PathBuf, sync::Arc, time::Duration};

const DEFAULT_GREETING: &str = "Welcome to the ironftp FTP server";
const DEFAULT_IDLE_SESSION_TIMEOUT_SECS: u64 = 600;
const DEFAULT_PASSIVE_PORTS: RangeInclusive<u16> = 49152..=65535;

/// Builder for [`Server`]. Create one through [`Server::with_fs`] or
/// [`ServerBuilder::new`], chain the options you need and call
/// [`build`](ServerBuilder::build).
pub struct ServerBuilder<Storage, User>
where
    Storage: StorageBackend<User>,
    User: UserDetail,
{
    storage: Box<dyn Fn() -> io::Result<Storage> + Send + Sync>,
    greeting: &'static str,
    authenticator: Option<Arc<dyn Authenticator<User>>>,
    passive_ports: RangeInclusive<u16>,
    mode: ServerMode,
    idle_session_timeout: Duration,
    logger: slog::Logger,
}

impl<Storage, User> ServerBuilder<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
    User: UserDetail + 'static,
{
    /// Creates a builder for a server serving the given storage back-end.
    /// The generator runs once, at [`build`](ServerBuilder::build) time;
    /// the resulting back-end instance is shared by all sessions.
    pub fn new(storage: Box<dyn Fn() -> io::Result<Storage> + Send + Sync>) -> Self {
        ServerBuilder {
            storage,
            greeting: DEFAULT_GREETING,
            authenticator: None,
            passive_ports: DEFAULT_PASSIVE_PORTS,
            mode: ServerMode::ReadWrite,
            idle_session_timeout: Duration::from_secs(DEFAULT_IDLE_SESSION_TIMEOUT_SECS),
            logger: slog::Logger::root(slog_stdlog::StdLog.fuse(), slog::o!()),
        }
    }

    /// Sets the greeting sent to clients right after they connect.
    pub fn greeting(mut self, greeting: &'static str) -> Self {
        self.greeting = greeting;
        self
    }

    /// Sets the [`Authenticator`] that will be used for authentication.
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator<User>>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Sets the range of ports used for passive data connections. The
    /// default is the IANA ephemeral range, 49152..=65535.
    pub fn passive_ports(mut self, ports: RangeInclusive<u16>) -> Self {
        self.passive_ports = ports;
        self
    }

    /// Sets whether clients may modify the served tree. The default is
    /// [`ServerMode::ReadWrite`].
    pub fn server_mode(mut self, mode: ServerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets how long a control connection may sit idle before it is
    /// closed. Transfers in progress keep the session alive. The default
    /// is ten minutes.
    pub fn idle_session_timeout(mut self, timeout: Duration) -> Self {
        self.idle_session_timeout = timeout;
        self
    }

    /// Sets the logger all server output goes to. Defaults to a logger
    /// that forwards to the `log` crate.
    pub fn logger(mut self, logger: slog::Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Builds the configured [`Server`]. This opens the storage back-end
    /// and fails if that fails or no authenticator was configured.
    pub fn build(self) -> Result<Server<Storage, User>, ServerError> {
        let storage = (self.storage)().map_err(ServerError::Storage)?;
        let authenticator = self.authenticator.ok_or(ServerError::NoCredentials)?;
        Ok(Server {
            storage: Arc::new(storage),
            greeting: self.greeting,
            authenticator,
            passive_ports: self.passive_ports,
            mode: self.mode,
            idle_session_timeout: self.idle_session_timeout,
            logger: self.logger,
            shutdown_topic: Arc::new(shutdown::Notifier::new()),
        })
    }
}

impl<Storage> ServerBuilder<Storage, DefaultUser>
where
    Storage: StorageBackend<DefaultUser> + 'static,
    Storage::Metadata: Metadata,
{
    /// Accepts logins for exactly this username/password pair. Shorthand
    /// for installing a [`StaticAuthenticator`].
    pub fn credentials(self, username: &str, password: &str) -> Self {
        self.authenticator(Arc::new(StaticAuthenticator::new(username, password)))
    }
}

/// An instance of an FTP server. It contains a reference to an
/// [`Authenticator`] that will be used for authentication, and a
/// [`StorageBackend`] that manages the virtual filesystem clients see.
///
/// The server is started with the [`listen`](Server::listen) method and
/// stopped through a [`StopHandle`] obtained before starting it.
///
/// # Example
///
/// ```no_run
/// use ironftp::Server;
///
/// #[tokio::main]
/// async fn main() {
///     let server = Server::with_fs("/srv/ftp")
///         .credentials("alice", "correct horse")
///         .build()
///         .unwrap();
///     let stop = server.stop_handle();
///     tokio::spawn(server.listen("127.0.0.1:2121"));
///     // ... later:
///     stop.stop().await;
/// }
/// ```
///
/// [`Authenticator`]: ../auth/trait.Authenticator.html
/// [`StorageBackend`]: ../storage/trait.StorageBackend.html
pub struct Server<Storage, User>
where
    Storage: StorageBackend<User>,
    User: UserDetail,
{
    storage: Arc<Storage>,
    greeting: &'static str,
    authenticator: Arc<dyn Authenticator<User>>,
    passive_ports: RangeInclusive<u16>,
    mode: ServerMode,
    idle_session_timeout: Duration,
    logger: slog::Logger,
    shutdown_topic: Arc<shutdown::Notifier>,
}

impl Server<Filesystem, DefaultUser> {
    /// Creates a builder for a server serving the given directory on
    /// local disk.
    ///
    /// # Example
    ///
    /// ```rust
    /// let builder = ironftp::Server::with_fs("/srv/ftp");
    /// ```
    pub fn with_fs<P: Into<PathBuf>>(path: P) -> ServerBuilder<Filesystem, DefaultUser> {
        let path = path.into();
        ServerBuilder::new(Box::new(move || Filesystem::new(path.clone())))
    }
}

impl<Storage, User> Server<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
    User: UserDetail + 'static,
{
    /// Returns a handle with which the running server can be stopped.
    /// Obtain it before calling [`listen`](Server::listen).
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            topic: self.shutdown_topic.clone(),
        }
    }

    /// Starts the server, accepting clients on the given address until
    /// [`StopHandle::stop`] is called. Returns once the listener closed.
    pub async fn listen<A: Into<String>>(self, bind_address: A) -> Result<(), ServerError> {
        let listener = listener::Listener {
            bind_address: bind_address.into(),
            logger: self.logger.clone(),
            shutdown_topic: self.shutdown_topic.clone(),
            config: control_loop::Config {
                storage: self.storage,
                greeting: self.greeting,
                authenticator: self.authenticator,
                passive_ports: self.passive_ports,
                mode: self.mode,
                idle_session_timeout: self.idle_session_timeout,
                logger: self.logger,
            },
        };
        listener.listen().await
    }
}

/// Stops a running [`Server`]. Handles can be cloned and stopping more
/// than once is harmless.
#[derive(Clone)]
pub struct StopHandle {
    topic: Arc<shutdown::Notifier>,
}

impl StopHandle {
    /// Asks the server to stop and waits until the listener and all
    /// sessions have shut down. In-flight sessions are told the service
    /// is going away with a `421` reply.
    pub async fn stop(&self) {
        self.topic.notify().await;
        self.topic.linger().await;
    }
}
