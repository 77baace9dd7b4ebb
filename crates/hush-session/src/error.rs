//! Error types for the session layer.

use hush_transport::ConnectionId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No session is bound to this connection.
    #[error("no session for {0}")]
    NotFound(ConnectionId),

    /// The connection already completed a handshake.
    #[error("{0} already has a session")]
    AlreadyConnected(ConnectionId),
}
