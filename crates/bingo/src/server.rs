//! Server assembly: builder, shared state, and the accept loop.

use std::sync::Arc;

use bingo_protocol::{JsonCodec, RoomCode, RoomSnapshot};
use bingo_room::{RoomError, RoomRegistry};
use bingo_transport::{Connection, Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::BingoError;
use crate::gateway::handle_connection;

/// Default bind address when the builder is not told otherwise.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// State shared between the accept loop and every connection task.
///
/// The registry mutex only guards the code→room table; room state itself
/// lives in the actors, so the critical sections here are tiny.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) codec: JsonCodec,
}

/// Builder for [`BingoServer`].
///
/// # Example
///
/// ```no_run
/// # async fn run() -> Result<(), bingo::BingoError> {
/// let server = bingo::BingoServer::builder()
///     .bind("127.0.0.1:8000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct BingoServerBuilder {
    bind_addr: String,
}

impl BingoServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }

    /// Sets the address to listen on. Use port `0` to let the OS pick.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Binds the listener and assembles the server.
    pub async fn build(self) -> Result<BingoServer, BingoError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        Ok(BingoServer {
            transport,
            state: Arc::new(ServerState {
                registry: Mutex::new(RoomRegistry::new()),
                codec: JsonCodec,
            }),
        })
    }
}

impl Default for BingoServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Administrative handle onto a running (or about-to-run) server.
///
/// Clones share the same room table; useful for pre-creating rooms or
/// inspecting them while `run` owns the server.
#[derive(Clone)]
pub struct ServerHandle {
    state: Arc<ServerState>,
}

impl ServerHandle {
    /// Creates a fresh empty room and returns its code.
    pub async fn create_room(&self) -> RoomCode {
        self.state.registry.lock().await.create()
    }

    /// Fetches the state-summary of a live room.
    pub async fn room_snapshot(&self, code: &RoomCode) -> Result<RoomSnapshot, RoomError> {
        let room = self.state.registry.lock().await.get(code)?;
        room.snapshot().await
    }

    /// Codes of all live rooms.
    pub async fn room_codes(&self) -> Vec<RoomCode> {
        self.state.registry.lock().await.codes()
    }
}

/// The bingo WebSocket server.
pub struct BingoServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl BingoServer {
    /// Starts configuring a server.
    pub fn builder() -> BingoServerBuilder {
        BingoServerBuilder::new()
    }

    /// The address the listener actually bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns an administrative handle that stays valid across `run`.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Accepts connections forever, spawning one gateway task per socket.
    pub async fn run(mut self) -> Result<(), BingoError> {
        loop {
            let conn = self.transport.accept().await?;
            let state = Arc::clone(&self.state);

            tokio::spawn(async move {
                let id = conn.id();
                if let Err(err) = handle_connection(conn, state).await {
                    tracing::warn!(conn = %id, %err, "connection task failed");
                }
            });
        }
    }
}
