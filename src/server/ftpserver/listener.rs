//! Contains the code that accepts control channel connections.

use super::error::ServerError;
use crate::{
    auth::UserDetail,
    server::{controlchan::control_loop, shutdown},
    storage::{Metadata, StorageBackend},
};
use std::sync::Arc;
use tokio::net::TcpListener;

// Listener listens for control channel connections on a TCP port and
// spawns a control channel loop in a new task for each incoming
// connection.
pub struct Listener<Storage, User>
where
    Storage: StorageBackend<User>,
    User: UserDetail,
{
    pub bind_address: String,
    pub logger: slog::Logger,
    pub config: control_loop::Config<Storage, User>,
    pub shutdown_topic: Arc<shutdown::Notifier>,
}

impl<Storage, User> Listener<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
    User: UserDetail + 'static,
{
    // Starts listening, returning an error if the TCP address could not
    // be bound to. Accept errors are logged and the loop continues; only
    // a shutdown notification ends it.
    pub async fn listen(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.bind_address).await.map_err(ServerError::Bind)?;
        slog::info!(self.logger, "Listening for control connections on {}", self.bind_address);
        let mut shutdown_listener = self.shutdown_topic.subscribe().await;
        loop {
            tokio::select! {
                _ = shutdown_listener.listen() => {
                    slog::info!(self.logger, "Shutting down listener");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((tcp_stream, socket_addr)) => {
                        slog::info!(self.logger, "Incoming control connection from {:?}", socket_addr);
                        let session_shutdown = self.shutdown_topic.subscribe().await;
                        let result = control_loop::spawn_loop::<Storage, User>(self.config.clone(), tcp_stream, session_shutdown).await;
                        if let Err(err) = result {
                            slog::error!(self.logger, "Could not spawn control channel loop for connection from {:?}: {:?}", socket_addr, err);
                        }
                    }
                    Err(err) => {
                        slog::error!(self.logger, "Error accepting incoming control connection {:?}", err);
                    }
                }
            }
        }
    }
}
