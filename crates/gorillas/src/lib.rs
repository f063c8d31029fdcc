//! # Gorillas
//!
//! WebSocket server for two-player Gorillas matches.
//!
//! Players connect, authenticate with a token, and are paired into a
//! match. From then on the server forwards their `ready`, `throwBanana`
//! and `endRound` events to the match actor and pushes the match's
//! events back out.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gorillas::prelude::*;
//!
//! struct AnyToken;
//!
//! impl Authenticator for AnyToken {
//!     async fn authenticate(&self, token: &str) -> Result<String, AuthError> {
//!         Ok(token.to_string())
//!     }
//! }
//!
//! # async fn start() -> Result<(), GorillasError> {
//! let server = GorillasServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(AnyToken)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod auth;
mod error;
mod handler;
mod server;
mod transport;

pub use auth::Authenticator;
pub use error::{AuthError, GorillasError, TransportError};
pub use server::{DEFAULT_HANDSHAKE_TIMEOUT, GorillasServer, GorillasServerBuilder};
pub use transport::{
    ConnectionId, ConnectionReader, ConnectionWriter, WebSocketConnection,
    WebSocketTransport,
};

/// Everything needed to run a server or write a client against it.
pub mod prelude {
    pub use crate::{
        AuthError, Authenticator, GorillasError, GorillasServer,
        GorillasServerBuilder,
    };
    pub use gorillas_match::{LevelConfig, MatchConfig, MatchError};
    pub use gorillas_protocol::{
        Building, ClientEvent, Frame, MatchId, PROTOCOL_VERSION, PlayerIndex,
        ServerEvent, SystemMessage,
    };
}
