//! `GorillasServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → match lobby.

use std::sync::Arc;
use std::time::Duration;

use gorillas_match::{MatchConfig, MatchManager};
use gorillas_protocol::{Codec, JsonCodec};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::transport::WebSocketTransport;
use crate::{Authenticator, GorillasError};

/// How long a fresh connection has to send its handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// State shared by every connection task.
pub(crate) struct ServerState<A: Authenticator, C: Codec> {
    pub(crate) matches: Mutex<MatchManager>,
    pub(crate) auth: A,
    pub(crate) codec: C,
    pub(crate) handshake_timeout: Duration,
}

/// Builder for configuring and starting a Gorillas server.
///
/// ```rust,ignore
/// let server = GorillasServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .match_config(MatchConfig::default())
///     .build(my_auth)
///     .await?;
/// server.run().await
/// ```
#[derive(Debug, Clone)]
pub struct GorillasServerBuilder {
    bind_addr: String,
    match_config: MatchConfig,
    handshake_timeout: Duration,
}

impl GorillasServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            match_config: MatchConfig::default(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Settings applied to every match the server creates.
    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Binds the listener. Frames are encoded with [`JsonCodec`].
    ///
    /// # Errors
    /// Fails if the match configuration's level settings are invalid or
    /// the address can't be bound.
    pub async fn build<A: Authenticator>(
        self,
        auth: A,
    ) -> Result<GorillasServer<A, JsonCodec>, GorillasError> {
        self.match_config.level.validate()?;
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            matches: Mutex::new(MatchManager::new(self.match_config)),
            auth,
            codec: JsonCodec,
            handshake_timeout: self.handshake_timeout,
        });

        Ok(GorillasServer { transport, state })
    }
}

impl Default for GorillasServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Gorillas server. Call [`run()`](Self::run) to start accepting
/// players.
pub struct GorillasServer<A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A, C>>,
}

impl<A: Authenticator, C: Codec> GorillasServer<A, C> {
    pub fn builder() -> GorillasServerBuilder {
        GorillasServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Accepts connections forever, one handler task per connection.
    pub async fn run(self) -> Result<(), GorillasError> {
        tracing::info!("Gorillas server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        let conn_id = conn.id();
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                %conn_id,
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
