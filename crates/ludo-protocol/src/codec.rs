//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The server only needs something that turns [`ServerMessage`]s into bytes
//! and bytes into [`ClientMessage`]s. [`JsonCodec`] is the only format the
//! Ludo clients speak today.
//!
//! [`ServerMessage`]: crate::ServerMessage
//! [`ClientMessage`]: crate::ClientMessage

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` so one codec can be shared by every connection
/// task through the server state.
pub trait Codec: Send + Sync + 'static {
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type (including unknown message tags).
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use ludo_protocol::{ClientMessage, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let msg: ClientMessage = codec
///     .decode(br#"{"type":"move_token","payload":{"tokenIndex":2}}"#)
///     .unwrap();
/// assert_eq!(msg, ClientMessage::MoveToken { token_index: 2 });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientMessage, PlayerId, ServerMessage};

    #[test]
    fn test_json_codec_encodes_server_message_as_utf8() {
        let bytes = JsonCodec
            .encode(&ServerMessage::PlayerLeft {
                player_id: PlayerId::from("p1"),
            })
            .unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.contains(r#""type":"player_left""#));
    }

    #[test]
    fn test_json_codec_decode_garbage_returns_decode_error() {
        let result: Result<ClientMessage, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_decode_unknown_tag_returns_decode_error() {
        let result: Result<ClientMessage, _> =
            JsonCodec.decode(br#"{"type":"teleport","payload":{}}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
