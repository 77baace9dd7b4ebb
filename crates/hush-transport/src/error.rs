use std::io;

/// Errors raised while accepting, reading or writing connections.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not bind its address.
    #[error("bind {addr} failed: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Accepting a TCP connection or upgrading it to WebSocket failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] io::Error),

    #[error("send failed: {0}")]
    SendFailed(#[source] io::Error),

    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] io::Error),

    /// The peer is gone; nothing more can be sent.
    #[error("connection closed")]
    ConnectionClosed,
}
