//! Messages that travel on the wire.
//!
//! Every frame is an [`Envelope`]. Its [`Payload`] is one of:
//!
//! - [`SystemMessage`]: connection plumbing (handshake, heartbeat, room
//!   listing, protocol errors), both directions.
//! - [`Action`]: a game move sent by a client.
//! - [`Event`]: a game event sent by the server.

use serde::{Deserialize, Serialize};

use crate::{
    Phase, PlayerId, PlayerInfo, RejectReason, RoomId, RoomSummary, RpsChoice,
    RpsOutcome,
};

// ---------------------------------------------------------------------------
// SystemMessage
// ---------------------------------------------------------------------------

/// Framework-level messages, independent of game rules.
///
/// Internally tagged: `{ "type": "Heartbeat", "client_time": 5000 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    /// Client → Server: first message on every connection.
    Handshake { version: u32 },

    /// Server → Client: the handshake was accepted and this connection
    /// now plays as `player_id`.
    HandshakeAck { player_id: PlayerId, server_time: u64 },

    /// Client → Server keep-alive. `client_time` is echoed back for RTT.
    Heartbeat { client_time: u64 },

    /// Server → Client reply to [`SystemMessage::Heartbeat`].
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// Client → Server: "show me the rooms". Does not require being in one.
    ListRooms,

    /// Server → Client reply to [`SystemMessage::ListRooms`].
    RoomList { rooms: Vec<RoomSummary> },

    /// Either direction: "I'm closing this connection."
    Disconnect { reason: String },

    /// Server → Client: a protocol-level failure (malformed frame,
    /// version mismatch). Game rule violations use [`Event::Rejected`].
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Action: client → server game moves
// ---------------------------------------------------------------------------

/// A game action. Every action except `Leave` names the room it targets.
///
/// Internally tagged, snake_case:
/// `{ "type": "ask_question", "room_id": "den", "question": "...", "receiver_id": 3 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Join `room_id`, creating it (named `room_name`) if it doesn't exist.
    Join {
        room_id: RoomId,
        room_name: String,
        display_name: String,
    },

    /// Creator only: Waiting → Playing.
    StartGame { room_id: RoomId },

    /// Current asker only: privately pose `question` to `receiver_id`.
    AskQuestion {
        room_id: RoomId,
        question: String,
        receiver_id: PlayerId,
    },

    /// Receiver only: nominate who answers on their behalf.
    SelectAnswer { room_id: RoomId, answerer_id: PlayerId },

    /// RPS participants only.
    SubmitRpsChoice { room_id: RoomId, choice: RpsChoice },

    /// Current asker only: pass the turn to the next player.
    SkipQuestion { room_id: RoomId },

    /// Leave whatever room the player is in.
    Leave,
}

impl Action {
    /// The room this action targets, if it names one.
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::Join { room_id, .. }
            | Self::StartGame { room_id }
            | Self::AskQuestion { room_id, .. }
            | Self::SelectAnswer { room_id, .. }
            | Self::SubmitRpsChoice { room_id, .. }
            | Self::SkipQuestion { room_id } => Some(room_id),
            Self::Leave => None,
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::StartGame { .. } => "start_game",
            Self::AskQuestion { .. } => "ask_question",
            Self::SelectAnswer { .. } => "select_answer",
            Self::SubmitRpsChoice { .. } => "submit_rps_choice",
            Self::SkipQuestion { .. } => "skip_question",
            Self::Leave => "leave",
        }
    }
}

// ---------------------------------------------------------------------------
// Event: server → client game events
// ---------------------------------------------------------------------------

/// A game event. Which players receive it is decided by the room
/// (see `Recipient`); the event itself doesn't say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// To the joining player only.
    RoomJoined { room_id: RoomId, room_name: String },

    /// Whole room: the roster or turn pointer changed.
    RosterUpdated {
        players: Vec<PlayerInfo>,
        phase: Phase,
        turn_index: usize,
        rps_participants: Vec<PlayerId>,
    },

    /// Whole room.
    GameStarted {
        turn_index: usize,
        current_asker: PlayerInfo,
    },

    /// To the receiver only: the private question.
    QuestionDelivered { question: String, asker_name: String },

    /// Whole room: who asked whom (never the question text).
    QuestionAnnounced {
        asker_name: String,
        receiver_name: String,
    },

    /// Whole room.
    AnswerAnnounced {
        receiver_name: String,
        answerer_name: String,
    },

    /// To the answerer only.
    RpsChallenge { challenger_name: String },

    /// Whole room. `participants` is `[receiver, answerer]`.
    RpsStarted {
        player1_name: String,
        player2_name: String,
        participants: [PlayerId; 2],
    },

    /// Whole room. On a tie `winner` and `revealed_question` are `None`
    /// and `next_asker` is the unchanged current asker.
    RpsResolved {
        outcome: RpsOutcome,
        revealed_question: Option<String>,
        winner: Option<PlayerId>,
        next_asker: Option<PlayerInfo>,
        receiver_name: String,
        answerer_name: String,
        receiver_choice: RpsChoice,
        answerer_choice: RpsChoice,
    },

    /// Whole room.
    TurnSkipped { next_asker: PlayerInfo },

    /// To the requester only.
    Rejected { reason: RejectReason },
}

// ---------------------------------------------------------------------------
// Payload / Envelope
// ---------------------------------------------------------------------------

/// The content of an envelope.
///
/// Adjacently tagged:
/// `{ "type": "Action", "data": { "type": "skip_question", "room_id": "den" } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    System(SystemMessage),
    Action(Action),
    Event(Event),
}

/// The top-level frame. Every message on the wire is an `Envelope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-direction sequence number, starting at 0.
    pub seq: u64,

    /// Milliseconds since the sender's connection started.
    pub timestamp: u64,

    pub payload: Payload,
}
