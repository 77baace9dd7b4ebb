//! The session manager: which connection plays as which player.
//!
//! `SessionManager` is not thread-safe by itself. The server keeps it
//! behind a mutex and only holds the lock for a map update.

use std::collections::HashMap;
use std::time::Instant;

use hush_protocol::PlayerId;
use hush_transport::ConnectionId;

use crate::{Session, SessionError};

/// Tracks every open session and hands out player ids.
///
/// Player ids are never reused within one process, so an event addressed
/// to a departed player can't reach whoever connects next.
#[derive(Debug)]
pub struct SessionManager {
    sessions: HashMap<ConnectionId, Session>,
    next_player_id: u64,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_player_id: 1,
        }
    }

    /// Opens a session for a connection that just completed its
    /// handshake and returns the player id it will play as.
    ///
    /// # Errors
    /// [`SessionError::AlreadyConnected`] if the connection already has one.
    pub fn create(&mut self, connection_id: ConnectionId) -> Result<PlayerId, SessionError> {
        if self.sessions.contains_key(&connection_id) {
            return Err(SessionError::AlreadyConnected(connection_id));
        }

        let player_id = PlayerId(self.next_player_id);
        self.next_player_id += 1;

        self.sessions.insert(
            connection_id,
            Session {
                connection_id,
                player_id,
                connected_at: Instant::now(),
            },
        );
        tracing::info!(%connection_id, %player_id, "session created");
        Ok(player_id)
    }

    /// Closes the connection's session and returns it.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if there is no session for it.
    pub fn end(&mut self, connection_id: ConnectionId) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(&connection_id)
            .ok_or(SessionError::NotFound(connection_id))?;
        tracing::info!(
            %connection_id,
            player_id = %session.player_id,
            secs = session.age().as_secs(),
            "session ended"
        );
        Ok(session)
    }

    /// The player a connection is playing as.
    pub fn player_for(&self, connection_id: ConnectionId) -> Option<PlayerId> {
        self.sessions.get(&connection_id).map(|s| s.player_id)
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
