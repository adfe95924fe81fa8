//! Unified error type for the server crate.

use lixi_protocol::ProtocolError;
use lixi_room::RoomError;

/// Top-level error wrapping the layer-specific errors plus the
/// WebSocket transport's own failures.
///
/// `#[from]` on each variant lets `?` convert sub-errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// An encode/decode failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A rejected room operation.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A WebSocket-level failure (handshake, send, recv).
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Binding or accepting connections failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The client went away while a reply was in flight.
    #[error("connection closed")]
    ConnectionClosed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lixi_protocol::RoomCode;

    #[test]
    fn test_from_room_error() {
        let err = RoomError::RoomNotFound(RoomCode::normalized("123456"));
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Room(_)));
        assert!(server_err.to_string().contains("123456"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Protocol(_)));
    }
}
