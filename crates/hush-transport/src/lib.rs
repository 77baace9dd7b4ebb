//! Transport layer for hush.
//!
//! A [`Transport`] hands out [`Connection`]s. A connection is split once,
//! right after accept, into a [`FrameSink`] and a [`FrameStream`] so the
//! reading half can wait on the network while another task writes.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketSink, WebSocketStream, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

/// Opaque identifier for one accepted socket.
///
/// Identifies the pipe, not the person using it; see `PlayerId` for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// The address the transport is listening on.
    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;
}

/// An accepted connection, before it is split into halves.
pub trait Connection: Send + 'static {
    type Sink: FrameSink;
    type Stream: FrameStream;

    fn id(&self) -> ConnectionId;

    /// The remote address.
    fn peer_addr(&self) -> SocketAddr;

    /// Splits into independently owned write and read halves.
    fn split(self) -> (Self::Sink, Self::Stream);
}

/// The write half of a connection.
pub trait FrameSink: Send + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the peer.
    async fn send(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Starts a clean close. Further sends fail.
    async fn close(&mut self) -> Result<(), Self::Error>;
}

/// The read half of a connection.
pub trait FrameStream: Send + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Receives the next frame.
    ///
    /// Returns `Ok(None)` when the peer has closed the connection.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, Self::Error>;
}
