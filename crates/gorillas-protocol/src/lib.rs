//! Wire protocol for the Gorillas match server.
//!
//! This crate defines everything that crosses a player's connection:
//!
//! - **Game events** ([`ClientEvent`], [`ServerEvent`]): the messages the
//!   match controller consumes and emits, named exactly as the browser
//!   client expects (`ready`, `throwBanana`, `roundStarted`, ...).
//! - **Framing** ([`Frame`], [`SystemMessage`]): the envelope that separates
//!   connection plumbing (handshake, errors) from game traffic.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, typed values out.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (Frame) → Match (ClientEvent / ServerEvent)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    Building, ClientEvent, Frame, MatchId, MatchStarted, PlayerIndex,
    Recipient, RoundStarted, ServerEvent, SystemMessage, PROTOCOL_VERSION,
};
