//! `LixiServer` builder and accept loop.
//!
//! Ties the layers together: WebSocket transport → protocol codec → room
//! registry. Each accepted connection gets its own handler task; each
//! room already runs as its own actor task, so the server never holds the
//! registry lock across I/O.

use std::sync::Arc;

use lixi_protocol::JsonCodec;
use lixi_room::RoomRegistry;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::ServerError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// The registry is only locked for create/lookup — room operations go
/// through cloned `RoomHandle`s outside the lock.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a lixi server.
///
/// # Example
///
/// ```rust,no_run
/// use lixi_server::LixiServerBuilder;
///
/// # async fn run() -> Result<(), lixi_server::ServerError> {
/// let server = LixiServerBuilder::new().bind("0.0.0.0:5000").build().await?;
/// server.run().await
/// # }
/// ```
pub struct LixiServerBuilder {
    bind_addr: String,
}

impl LixiServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<LixiServer, ServerError> {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "listener bound");

        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new()),
            codec: JsonCodec,
        });

        Ok(LixiServer { listener, state })
    }
}

impl Default for LixiServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running lixi server.
pub struct LixiServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl LixiServer {
    pub fn builder() -> LixiServerBuilder {
        LixiServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("lixi server running");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, peer, state).await
                        {
                            tracing::debug!(
                                %peer,
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
