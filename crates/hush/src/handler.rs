//! Per-connection handler: handshake, then shuttle frames between the
//! socket and the room registry.
//!
//! Each accepted connection gets its own task running this handler:
//!   1. Receive `Handshake` → validate version → open a session
//!   2. Send `HandshakeAck` with the assigned `PlayerId`
//!   3. Spawn a writer task that owns the socket's write half
//!   4. Loop: receive envelopes → answer system messages, forward actions
//!
//! However the loop ends (clean close, error, idle timeout) the player
//! leaves their room.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hush_protocol::{Codec, Envelope, Event, Payload, PlayerId, ProtocolError, SystemMessage};
use hush_transport::{
    Connection, ConnectionId, FrameSink, FrameStream, WebSocketConnection, WebSocketSink,
    WebSocketStream,
};
use tokio::sync::mpsc;

use crate::server::{ServerState, PROTOCOL_VERSION};
use crate::HushError;

/// Error codes carried by `SystemMessage::Error`.
const CODE_BAD_REQUEST: u16 = 400;
const CODE_UPGRADE_REQUIRED: u16 = 426;
const CODE_UNAVAILABLE: u16 = 503;

/// Milliseconds since the connection was accepted.
#[derive(Clone, Copy)]
struct Clock(Instant);

impl Clock {
    fn now(&self) -> u64 {
        millis(self.0.elapsed())
    }
}

/// Saturates instead of wrapping once the count no longer fits.
fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Ends the session and removes the player from their room when the
/// handler exits, including by panic. `Drop` is synchronous, so the
/// async cleanup runs on a spawned task.
struct ConnectionGuard<C: Codec> {
    connection_id: ConnectionId,
    player_id: PlayerId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        let connection_id = self.connection_id;
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let _ = state.sessions.lock().await.end(connection_id);
            if let Err(e) = state.registry.disconnect(player_id).await {
                tracing::debug!(%player_id, error = %e, "registry gone during cleanup");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), HushError> {
    let connection_id = conn.id();
    let peer = conn.peer_addr();
    let clock = Clock(Instant::now());
    tracing::debug!(%connection_id, %peer, "handling new connection");

    let (mut sink, mut stream) = conn.split();

    // --- Step 1: Handshake ---
    let player_id = match perform_handshake(&mut sink, &mut stream, &state, connection_id, clock).await {
        Ok(player_id) => player_id,
        Err(e) => {
            let _ = sink.close().await;
            return Err(e);
        }
    };
    let guard = ConnectionGuard {
        connection_id,
        player_id,
        state: Arc::clone(&state),
    };
    tracing::info!(%connection_id, %player_id, "player connected");

    // --- Step 2: Outbound plumbing ---
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();
    state.registry.connect(player_id, event_tx).await?;
    let writer = tokio::spawn(write_loop(sink, event_rx, reply_rx, Arc::clone(&state), clock));

    // --- Step 3: Message loop ---
    loop {
        let data = match tokio::time::timeout(state.idle_timeout, stream.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%player_id, "connection idle, closing");
                let _ = reply_tx.send(SystemMessage::Disconnect {
                    reason: "idle timeout".into(),
                });
                break;
            }
        };

        let envelope: Envelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode envelope");
                let _ = reply_tx.send(error_message(CODE_BAD_REQUEST, format!("malformed envelope: {e}")));
                continue;
            }
        };

        match envelope.payload {
            Payload::System(msg) => {
                if handle_system_message(&state, player_id, msg, &reply_tx, clock).await {
                    break;
                }
            }
            Payload::Action(action) => {
                tracing::debug!(
                    %player_id,
                    action = action.name(),
                    room_id = ?action.room_id(),
                    "action received"
                );
                if state.registry.submit(player_id, action).await.is_err() {
                    let _ = reply_tx.send(error_message(CODE_UNAVAILABLE, "server shutting down"));
                    break;
                }
            }
            Payload::Event(_) => {
                let _ = reply_tx.send(error_message(CODE_BAD_REQUEST, "clients cannot send events"));
            }
        }
    }

    // Leaving the room drops the registry's end of the event channel,
    // which lets the writer drain and close the socket.
    drop(reply_tx);
    drop(guard);
    let _ = writer.await;
    Ok(())
}

/// Receives the first frame and validates it as a `Handshake`; on
/// success opens a session and sends the `HandshakeAck`.
async fn perform_handshake<C: Codec>(
    sink: &mut WebSocketSink,
    stream: &mut WebSocketStream,
    state: &ServerState<C>,
    connection_id: ConnectionId,
    clock: Clock,
) -> Result<PlayerId, HushError> {
    let data = match tokio::time::timeout(state.handshake_timeout, stream.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage("connection closed before handshake".into()).into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let version = match state.codec.decode::<Envelope>(&data) {
        Ok(Envelope {
            payload: Payload::System(SystemMessage::Handshake { version }),
            ..
        }) => version,
        Ok(_) => {
            send_direct(sink, state, clock, error_message(CODE_BAD_REQUEST, "expected Handshake")).await?;
            return Err(ProtocolError::InvalidMessage("first message must be Handshake".into()).into());
        }
        Err(e) => {
            send_direct(sink, state, clock, error_message(CODE_BAD_REQUEST, format!("malformed envelope: {e}"))).await?;
            return Err(e.into());
        }
    };

    if version != PROTOCOL_VERSION {
        let message = format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}");
        send_direct(sink, state, clock, error_message(CODE_UPGRADE_REQUIRED, message)).await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    let player_id = state.sessions.lock().await.create(connection_id)?;
    let ack = SystemMessage::HandshakeAck {
        player_id,
        server_time: clock.now(),
    };
    if let Err(e) = send_direct(sink, state, clock, ack).await {
        let _ = state.sessions.lock().await.end(connection_id);
        return Err(e);
    }
    Ok(player_id)
}

/// Answers a system message. Returns `true` if the connection should close.
async fn handle_system_message<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    msg: SystemMessage,
    replies: &mpsc::UnboundedSender<SystemMessage>,
    clock: Clock,
) -> bool {
    let reply = match msg {
        SystemMessage::Heartbeat { client_time } => SystemMessage::HeartbeatAck {
            client_time,
            server_time: clock.now(),
        },
        SystemMessage::ListRooms => match state.registry.list_rooms().await {
            Ok(rooms) => SystemMessage::RoomList { rooms },
            Err(_) => {
                let _ = replies.send(error_message(CODE_UNAVAILABLE, "server shutting down"));
                return true;
            }
        },
        SystemMessage::Disconnect { reason } => {
            tracing::info!(%player_id, %reason, "client disconnected");
            return true;
        }
        other => {
            tracing::debug!(%player_id, ?other, "unexpected system message");
            error_message(CODE_BAD_REQUEST, "unexpected system message")
        }
    };
    let _ = replies.send(reply);
    false
}

/// Owns the write half. Events from the registry and replies from the
/// reader each get the next sequence number as they go out.
///
/// Exits once the registry drops the event channel, then closes the socket.
async fn write_loop<C: Codec>(
    mut sink: WebSocketSink,
    mut events: mpsc::UnboundedReceiver<Event>,
    mut replies: mpsc::UnboundedReceiver<SystemMessage>,
    state: Arc<ServerState<C>>,
    clock: Clock,
) {
    // The handshake ack went out as seq 0.
    let mut seq: u64 = 1;
    let mut replies_open = true;

    loop {
        // Replies first, so a final Disconnect or Error goes out before
        // the closed event channel ends the loop.
        let payload = tokio::select! {
            biased;
            reply = replies.recv(), if replies_open => match reply {
                Some(reply) => Payload::System(reply),
                None => {
                    replies_open = false;
                    continue;
                }
            },
            event = events.recv() => match event {
                Some(event) => Payload::Event(event),
                None => break,
            },
        };

        let envelope = Envelope {
            seq: next_seq(&mut seq),
            timestamp: clock.now(),
            payload,
        };
        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(id = %sink.id(), error = %e, "failed to encode envelope");
                continue;
            }
        };
        if let Err(e) = sink.send(&bytes).await {
            tracing::debug!(id = %sink.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }

    let _ = sink.close().await;
}

/// Sends one system message straight on the sink, before the writer
/// task exists. Always uses seq 0.
async fn send_direct<C: Codec>(
    sink: &mut WebSocketSink,
    state: &ServerState<C>,
    clock: Clock,
    msg: SystemMessage,
) -> Result<(), HushError> {
    let envelope = Envelope {
        seq: 0,
        timestamp: clock.now(),
        payload: Payload::System(msg),
    };
    let bytes = state.codec.encode(&envelope)?;
    sink.send(&bytes).await?;
    Ok(())
}

fn error_message(code: u16, message: impl Into<String>) -> SystemMessage {
    SystemMessage::Error {
        code,
        message: message.into(),
    }
}

fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
