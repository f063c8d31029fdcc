//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, unknown event name,
    /// missing fields, or a truncated frame.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded fine but breaks a protocol rule, e.g. a game
    /// event sent before the handshake.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
