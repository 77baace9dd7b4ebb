//! Wire protocol for hush.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`PlayerId`], [`RoomId`], [`Phase`], [`RpsChoice`], ...):
//!   the vocabulary shared by every layer above.
//! - **Messages** ([`Envelope`], [`SystemMessage`], [`Action`], [`Event`]):
//!   the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding or
//!   decoding.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session / Room (game rules)
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{Action, Envelope, Event, Payload, SystemMessage};
pub use types::{
    Phase, PlayerId, PlayerInfo, Recipient, RejectReason, RoomId,
    RoomSummary, RpsChoice, RpsOutcome,
};
