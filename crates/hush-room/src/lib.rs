//! The game core for hush.
//!
//! One player (the Asker) privately poses a question to a Receiver, who
//! nominates an Answerer. A rock-paper-scissors duel between Receiver and
//! Answerer decides whether the question is revealed and who asks next.
//!
//! # Key types
//!
//! - [`GameRoom`]: per-room turn/phase state machine
//! - [`gate`]: authorization predicates checked before any mutation
//! - [`rps`]: the pure duel resolver
//! - [`RoomRegistry`]: owns every room, creates on first join, destroys
//!   on last leave
//! - [`RegistryHandle`]: send commands to the single task that owns the
//!   registry
//! - [`RoomConfig`]: roster limits

mod actor;
mod config;
mod error;
pub mod gate;
mod registry;
mod room;
pub mod rps;

pub use actor::{spawn_registry, PlayerSender, RegistryHandle, DEFAULT_CHANNEL_SIZE};
pub use config::{RoomConfig, MAX_PLAYERS, MIN_PLAYERS};
pub use error::GameError;
pub use registry::{Delivery, RoomRegistry};
pub use room::{GameRoom, Outbound, Player, Question, RoundRecord, RoundState, RpsChoices};
