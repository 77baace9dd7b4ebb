//! Error types for the game core.

use hush_protocol::{Phase, PlayerId, RejectReason, RoomId};

/// Everything that can stop an action from being applied.
///
/// All of these are local to one request: the action is dropped, the
/// room is untouched, and only the requester hears about it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Join attempted on a room already at its maximum roster size.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The action names a room that doesn't exist.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The actor is not the player this transition belongs to.
    #[error("player {0} is not allowed to do that")]
    NotAuthorized(PlayerId),

    /// The actor is eligible, but the room is in the wrong phase.
    #[error("not allowed while the room is {0}")]
    InvalidPhase(Phase),

    /// An RPS choice from someone who isn't one of the two duelists.
    #[error("player {0} is not in the current duel")]
    InvalidRpsParticipant(PlayerId),

    /// The creator tried to start with too few players.
    #[error("need at least {required} players, have {present}")]
    NotEnoughPlayers { required: usize, present: usize },

    /// The actor isn't on the roster of the room they named.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// The player is already on a roster and can only be in one room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// A receiver or answerer that can't take that role.
    #[error("player {0} cannot be chosen here")]
    InvalidTarget(PlayerId),

    /// The registry task is gone (shut down or its channel closed).
    #[error("room registry is unavailable")]
    Unavailable,
}

impl GameError {
    /// The wire code sent back in a `rejected` event.
    ///
    /// Returns `None` for [`GameError::Unavailable`], which is a server
    /// fault rather than a rule violation.
    pub fn reason(&self) -> Option<RejectReason> {
        let reason = match self {
            Self::RoomFull(_) => RejectReason::RoomFull,
            Self::RoomNotFound(_) => RejectReason::RoomNotFound,
            Self::NotAuthorized(_) => RejectReason::NotAuthorized,
            Self::InvalidPhase(_) => RejectReason::InvalidPhase,
            Self::InvalidRpsParticipant(_) => RejectReason::InvalidRpsParticipant,
            Self::NotEnoughPlayers { .. } => RejectReason::NotEnoughPlayers,
            Self::NotInRoom(..) => RejectReason::NotInRoom,
            Self::AlreadyInRoom(..) => RejectReason::AlreadyInRoom,
            Self::InvalidTarget(_) => RejectReason::InvalidTarget,
            Self::Unavailable => return None,
        };
        Some(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_maps_rule_violations() {
        assert_eq!(
            GameError::RoomFull(RoomId::from("den")).reason(),
            Some(RejectReason::RoomFull)
        );
        assert_eq!(
            GameError::InvalidPhase(Phase::Waiting).reason(),
            Some(RejectReason::InvalidPhase)
        );
        assert_eq!(
            GameError::NotEnoughPlayers { required: 4, present: 3 }.reason(),
            Some(RejectReason::NotEnoughPlayers)
        );
    }

    #[test]
    fn test_unavailable_has_no_reason() {
        assert_eq!(GameError::Unavailable.reason(), None);
    }

    #[test]
    fn test_error_messages() {
        let err = GameError::NotInRoom(PlayerId(3), RoomId::from("den"));
        assert_eq!(err.to_string(), "player P-3 not in room R-den");
        let err = GameError::InvalidPhase(Phase::RpsPending);
        assert_eq!(err.to_string(), "not allowed while the room is rps_pending");
    }
}
