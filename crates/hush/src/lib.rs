//! # hush
//!
//! Server for a party game of secret questions and rock-paper-scissors.
//!
//! The Asker privately poses a question to a Receiver, who nominates an
//! Answerer. The two duel at rock-paper-scissors: if the Answerer wins
//! the question is revealed to the room, otherwise it stays secret, and
//! the winner asks next.
//!
//! Clients speak JSON envelopes over WebSocket. All game state lives in
//! one task (the room registry); connection handlers only forward actions
//! and relay events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hush::prelude::*;
//!
//! # async fn run() -> Result<(), HushError> {
//! let server = HushServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .room_config(RoomConfig { min_players: 4, max_players: 8 })
//!     .build()
//!     .await?;
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::HushError;
pub use server::{HushServer, HushServerBuilder, PROTOCOL_VERSION};

/// Everything a server binary or test client needs.
pub mod prelude {
    pub use crate::{HushError, HushServer, HushServerBuilder, PROTOCOL_VERSION};
    pub use hush_protocol::{
        Action, Envelope, Event, Payload, Phase, PlayerId, PlayerInfo, RejectReason, RoomId,
        RoomSummary, RpsChoice, RpsOutcome, SystemMessage,
    };
    pub use hush_room::{GameError, RegistryHandle, RoomConfig};
}
