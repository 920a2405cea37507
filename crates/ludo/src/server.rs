//! `LudoServer` builder and server loop.
//!
//! This is the entry point for running a Ludo game server. It ties
//! together all the layers: transport → protocol → matchmaking → session.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ludo_matchmaking::{MatchmakingQueue, QueueConfig};
use ludo_protocol::{Codec, JsonCodec};
use ludo_session::{SessionConfig, SessionRegistry};
use ludo_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::LudoError;
use crate::handler::handle_connection;
use crate::sweep::spawn_sweeper;

/// Shared server state passed to each connection handler task.
///
/// Lock order is `queue` then `registry`. Neither lock is held while
/// waiting on a session actor, except that `join_queue` checks the joiner's
/// current session with the queue lock held.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) queue: Mutex<MatchmakingQueue>,
    pub(crate) registry: Mutex<SessionRegistry>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Ludo server.
///
/// # Example
///
/// ```rust,no_run
/// use ludo::prelude::*;
///
/// # async fn start() -> Result<(), LudoError> {
/// let server = LudoServer::builder()
///     .bind("0.0.0.0:8080")
///     .session_config(SessionConfig {
///         allow_forced_dice: true,
///         ..SessionConfig::default()
///     })
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct LudoServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    queue_config: QueueConfig,
}

impl LudoServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
            queue_config: QueueConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets rules, forced dice, and sweep timings for every session.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn queue_config(mut self, config: QueueConfig) -> Self {
        self.queue_config = config;
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<LudoServer<JsonCodec>, LudoError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let sweep_interval = self.session_config.sweep_interval;

        let state = Arc::new(ServerState {
            queue: Mutex::new(MatchmakingQueue::new(self.queue_config)),
            registry: Mutex::new(SessionRegistry::new(self.session_config)),
            codec: JsonCodec,
        });

        Ok(LudoServer {
            transport,
            state,
            sweep_interval,
        })
    }
}

impl Default for LudoServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Ludo game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct LudoServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
    sweep_interval: Duration,
}

impl LudoServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> LudoServerBuilder {
        LudoServerBuilder::new()
    }
}

impl<C: Codec> LudoServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, LudoError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the session sweeper and the accept loop.
    ///
    /// Spawns a handler task for each connected player. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), LudoError> {
        let _sweeper = spawn_sweeper(Arc::clone(&self.state), self.sweep_interval);
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Ludo server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
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
