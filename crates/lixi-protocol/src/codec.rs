//! Codec trait and the default JSON implementation.
//!
//! The server doesn't care how messages are serialized — it only needs
//! something implementing [`Codec`]. [`JsonCodec`] is the default and what
//! browser clients speak; a binary codec could be swapped in without
//! touching the handler.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts protocol types to and from wire bytes.
///
/// `Send + Sync + 'static` because one codec instance is shared across
/// every connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable and trivially debuggable from browser DevTools.
/// Behind the `json` feature (enabled by default).
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
    use crate::{ClientRequest, Reply, ServerMessage};

    #[test]
    fn test_json_codec_round_trips_requests() {
        let codec = JsonCodec;
        let req = ClientRequest::Join {
            code: "123456".to_string(),
            name: "An".to_string(),
        };
        let bytes = codec.encode(&req).unwrap();
        let back: ClientRequest = codec.decode(&bytes).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn test_json_codec_round_trips_server_messages() {
        let codec = JsonCodec;
        let msg = ServerMessage::Reply(Reply::Ok);
        let bytes = codec.encode(&msg).unwrap();
        let back: ServerMessage = codec.decode(&bytes).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        let codec = JsonCodec;
        let result: Result<ClientRequest, _> = codec.decode(b"not json");
        assert!(result.is_err());
    }

    #[test]
    fn test_json_codec_rejects_unknown_request_type() {
        let codec = JsonCodec;
        let result: Result<ClientRequest, _> =
            codec.decode(br#"{"type":"reboot_server"}"#);
        assert!(result.is_err());
    }
}
