use std::time::{Duration, Instant};

use hush_protocol::PlayerId;
use hush_transport::ConnectionId;

/// One live player connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub connection_id: ConnectionId,
    pub player_id: PlayerId,
    pub connected_at: Instant,
}

impl Session {
    /// How long the session has been open.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
