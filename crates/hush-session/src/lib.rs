//! Player sessions for hush.
//!
//! A session starts when a connection completes its handshake and ends
//! when the connection goes away. It is the only place a
//! [`ConnectionId`](hush_transport::ConnectionId) is turned into a
//! [`PlayerId`](hush_protocol::PlayerId).
//!
//! ```text
//! Room layer (above)     ← only ever sees PlayerId
//!     ↕
//! Session layer (here)   ← ConnectionId ↔ PlayerId
//!     ↕
//! Transport (below)      ← only ever sees ConnectionId
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::Session;
