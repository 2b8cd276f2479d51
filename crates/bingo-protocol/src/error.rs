//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating
/// wire-level data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields,
    /// an unknown `type` tag, or truncated messages.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A room code that is not 5 uppercase alphanumeric characters.
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),

    /// A player name that is empty or whitespace-only.
    #[error("player name must not be empty")]
    EmptyPlayerName,

    /// The message is well-formed but violates protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
