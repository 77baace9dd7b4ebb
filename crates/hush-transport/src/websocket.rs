//! WebSocket transport using `tokio-tungstenite`.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, FrameSink, FrameStream, Transport, TransportError};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

fn io_error<E>(kind: io::ErrorKind, err: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(kind, err)
}

/// Listens for TCP connections and upgrades each one to WebSocket.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds to `addr`. Use port 0 to let the OS choose.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_owned(),
                source,
            })?;
        if let Ok(local) = listener.local_addr() {
            tracing::info!(%local, "WebSocket transport listening");
        }
        Ok(Self { listener })
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
            TransportError::AcceptFailed(io_error(io::ErrorKind::ConnectionRefused, e))
        })?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %peer, "accepted WebSocket connection");

        Ok(WebSocketConnection { id, peer, ws })
    }

    fn local_addr(&self) -> Result<SocketAddr, Self::Error> {
        self.listener.local_addr().map_err(TransportError::AcceptFailed)
    }
}

/// An upgraded WebSocket, not yet split.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    ws: WsStream,
}

impl Connection for WebSocketConnection {
    type Sink = WebSocketSink;
    type Stream = WebSocketStream;

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn split(self) -> (WebSocketSink, WebSocketStream) {
        let (sink, stream) = self.ws.split();
        (
            WebSocketSink { id: self.id, sink },
            WebSocketStream { id: self.id, stream },
        )
    }
}

/// Write half. UTF-8 payloads go out as text frames, anything else binary.
pub struct WebSocketSink {
    id: ConnectionId,
    sink: SplitSink<WsStream, Message>,
}

impl WebSocketSink {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl FrameSink for WebSocketSink {
    type Error = TransportError;

    async fn send(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = match std::str::from_utf8(data) {
            Ok(text) => Message::text(text.to_owned()),
            Err(_) => Message::binary(data.to_vec()),
        };
        self.sink
            .send(msg)
            .await
            .map_err(|e| TransportError::SendFailed(io_error(io::ErrorKind::BrokenPipe, e)))
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.sink
            .close()
            .await
            .map_err(|e| TransportError::SendFailed(io_error(io::ErrorKind::BrokenPipe, e)))
    }
}

/// Read half. Control frames are skipped.
pub struct WebSocketStream {
    id: ConnectionId,
    stream: SplitStream<WsStream>,
}

impl WebSocketStream {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl FrameStream for WebSocketStream {
    type Error = TransportError;

    async fn recv(&mut self) -> Result<Option<Vec<u8>>, Self::Error> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.to_vec())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // ping/pong/raw frames
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io_error(
                        io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }
}
