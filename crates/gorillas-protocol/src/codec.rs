//! Codec trait and the JSON implementation.
//!
//! The connection handler never touches `serde_json` directly; it goes
//! through a [`Codec`] so the framing can be swapped without touching
//! the handler or the match crate.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Converts typed frames to bytes and back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that speaks JSON, which is what the browser client sends.
///
/// ```rust
/// use gorillas_protocol::{ClientEvent, Codec, Frame, JsonCodec};
///
/// let codec = JsonCodec;
/// let frame: Frame<ClientEvent> = Frame::Game(ClientEvent::Ready);
///
/// let bytes = codec.encode(&frame).unwrap();
/// let decoded: Frame<ClientEvent> = codec.decode(&bytes).unwrap();
/// assert_eq!(frame, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
