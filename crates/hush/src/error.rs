//! Unified error type for the hush server.

use hush_protocol::ProtocolError;
use hush_room::GameError;
use hush_session::SessionError;
use hush_transport::TransportError;

/// Top-level error wrapping every layer's error.
///
/// Only connection- and startup-level failures surface as `HushError`.
/// Rule violations inside a room are answered with a `rejected` event
/// and never get this far.
#[derive(Debug, thiserror::Error)]
pub enum HushError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// The room registry is unreachable.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The server was configured with values it can't run with.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use hush_transport::ConnectionId;

    #[test]
    fn test_from_transport_error() {
        let err: HushError = TransportError::ConnectionClosed.into();
        assert!(matches!(err, HushError::Transport(_)));
        assert_eq!(err.to_string(), "connection closed");
    }

    #[test]
    fn test_from_protocol_error() {
        let err: HushError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, HushError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err: HushError = SessionError::NotFound(ConnectionId::new(1)).into();
        assert!(matches!(err, HushError::Session(_)));
    }

    #[test]
    fn test_from_game_error() {
        let err: HushError = GameError::Unavailable.into();
        assert!(matches!(err, HushError::Game(GameError::Unavailable)));
    }
}
