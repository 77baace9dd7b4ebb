//! `HushServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session → room.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hush_protocol::{Codec, JsonCodec};
use hush_room::{
    spawn_registry, RegistryHandle, RoomConfig, RoomRegistry, DEFAULT_CHANNEL_SIZE, MAX_PLAYERS,
    MIN_PLAYERS,
};
use hush_session::SessionManager;
use hush_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::HushError;

/// The protocol version clients must send in their handshake.
pub const PROTOCOL_VERSION: u32 = 1;

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// State shared by every connection handler.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) registry: RegistryHandle,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
    pub(crate) handshake_timeout: Duration,
}

/// Builder for configuring and starting a hush server.
///
/// ```rust,no_run
/// # async fn run() -> Result<(), hush::HushError> {
/// let server = hush::HushServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct HushServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    idle_timeout: Duration,
    handshake_timeout: Duration,
    channel_size: usize,
    seed: Option<u64>,
}

impl HushServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            channel_size: DEFAULT_CHANNEL_SIZE,
            seed: None,
        }
    }

    /// Sets the listen address. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the roster limits for every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Closes connections that send nothing for this long.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Closes connections that don't complete the handshake in time.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Depth of the registry's command queue.
    pub fn channel_size(mut self, size: usize) -> Self {
        self.channel_size = size;
        self
    }

    /// Seeds the starting-asker draw, for reproducible games.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Binds the listener and starts the room registry.
    ///
    /// # Errors
    /// [`HushError::Config`] for unusable roster limits or a zero-sized
    /// queue, [`HushError::Transport`] if the address can't be bound.
    pub async fn build(self) -> Result<HushServer, HushError> {
        if !self.room_config.is_valid() {
            return Err(HushError::Config(format!(
                "need {MIN_PLAYERS} <= min_players <= max_players <= {MAX_PLAYERS} (got {}..{})",
                self.room_config.min_players, self.room_config.max_players
            )));
        }
        if self.channel_size == 0 {
            return Err(HushError::Config("channel_size must be positive".into()));
        }

        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let registry = match self.seed {
            Some(seed) => RoomRegistry::with_seed(self.room_config, seed),
            None => RoomRegistry::new(self.room_config),
        };
        let registry = spawn_registry(registry, self.channel_size);

        tracing::info!(
            min_players = self.room_config.min_players,
            max_players = self.room_config.max_players,
            idle_secs = self.idle_timeout.as_secs(),
            "hush server built"
        );

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new()),
            registry,
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
            handshake_timeout: self.handshake_timeout,
        });

        Ok(HushServer { transport, state })
    }
}

impl Default for HushServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound hush server. Call [`run`](Self::run) to start accepting.
pub struct HushServer {
    transport: WebSocketTransport,
    state: Arc<ServerState<JsonCodec>>,
}

impl HushServer {
    pub fn builder() -> HushServerBuilder {
        HushServerBuilder::new()
    }

    pub fn local_addr(&self) -> Result<SocketAddr, HushError> {
        Ok(self.transport.local_addr()?)
    }

    /// A handle to the room registry, for in-process inspection.
    pub fn registry(&self) -> RegistryHandle {
        self.state.registry.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), HushError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then stops the
    /// room registry. Connections already open see their game end.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), HushError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("hush server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("hush server shutting down");
        self.state.registry.shutdown().await?;
        Ok(())
    }
}
