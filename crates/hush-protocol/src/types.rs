//! Core vocabulary shared by every layer: identities, phases, RPS
//! choices, and the summaries that appear inside messages.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable identifier for a player, assigned by the server when a
/// connection completes its handshake.
///
/// This is deliberately NOT the connection's identity: a `PlayerId`
/// names who is playing, a `ConnectionId` names the socket carrying
/// their traffic. Keeping them apart leaves room for reconnection later.
///
/// `#[serde(transparent)]` makes `PlayerId(42)` serialize as plain `42`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A room identifier chosen by the client that first joins it.
///
/// Unlike [`PlayerId`] this is a string: players share room ids out of
/// band ("join room `friday-night`").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an event?
// ---------------------------------------------------------------------------

/// The audience for an outbound event, relative to the room that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player currently in the room.
    All,

    /// One specific player (the receiver of a private question, the
    /// requester of a rejected action, ...).
    Player(PlayerId),
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The stage a room's turn state machine is in.
///
/// ```text
///            startGame           askQuestion            selectAnswer
/// Waiting ─────────────→ Playing ───────────→ QuestionAsked ──────────→ RpsPending
///    ↑                    ↑  ↺ skipQuestion                               │  ↺ tie
///    │                    └───────────────────────────────────────────────┘
///    │                                decisive RPS result
///    └── roster drops below the minimum (from any other phase)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    Playing,
    QuestionAsked,
    RpsPending,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::QuestionAsked => write!(f, "question_asked"),
            Self::RpsPending => write!(f, "rps_pending"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rock-paper-scissors
// ---------------------------------------------------------------------------

/// One hand in a rock-paper-scissors duel. Serialized lowercase
/// (`"rock"`, `"paper"`, `"scissors"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpsChoice {
    Rock,
    Paper,
    Scissors,
}

impl RpsChoice {
    /// All three choices, in a fixed order.
    pub const ALL: [RpsChoice; 3] = [Self::Rock, Self::Paper, Self::Scissors];
}

impl fmt::Display for RpsChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rock => write!(f, "rock"),
            Self::Paper => write!(f, "paper"),
            Self::Scissors => write!(f, "scissors"),
        }
    }
}

/// The result of a duel between the Receiver and the Answerer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpsOutcome {
    /// Both picked the same hand; the duel is replayed.
    Tie,
    /// The Receiver won: the question stays secret.
    ReceiverWins,
    /// The Answerer won: the question is revealed to the room.
    AnswererWins,
}

impl RpsOutcome {
    /// Returns `true` if this outcome discloses the question.
    pub fn reveals_question(self) -> bool {
        matches!(self, Self::AnswererWins)
    }
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Machine-readable reason attached to a `rejected` event.
///
/// A rejection only ever reaches the player who sent the offending
/// action; the room is left exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    RoomFull,
    RoomNotFound,
    NotAuthorized,
    InvalidPhase,
    InvalidRpsParticipant,
    NotEnoughPlayers,
    NotInRoom,
    AlreadyInRoom,
    InvalidTarget,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::RoomFull => "room_full",
            Self::RoomNotFound => "room_not_found",
            Self::NotAuthorized => "not_authorized",
            Self::InvalidPhase => "invalid_phase",
            Self::InvalidRpsParticipant => "invalid_rps_participant",
            Self::NotEnoughPlayers => "not_enough_players",
            Self::NotInRoom => "not_in_room",
            Self::AlreadyInRoom => "already_in_room",
            Self::InvalidTarget => "invalid_target",
        };
        f.write_str(code)
    }
}

// ---------------------------------------------------------------------------
// Summaries carried inside events
// ---------------------------------------------------------------------------

/// Public view of a roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub display_name: String,
    pub room_id: RoomId,
}

/// One line of the pre-join room listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub player_count: usize,
    pub phase: Phase,
}
