//! Authorization predicates.
//!
//! Each check reads the room and returns `Ok(())` if `actor` may perform
//! the transition right now. They never mutate, so a transition can run
//! its check first and bail out with the room exactly as it was.
//!
//! Every check first requires the actor to be on the room's roster.
//! After that, an actor who isn't the one the transition belongs to gets
//! [`GameError::NotAuthorized`]; the right actor at the wrong time gets
//! [`GameError::InvalidPhase`].

use hush_protocol::{Phase, PlayerId};

use crate::{GameError, GameRoom};

/// Creator only, from Waiting, with at least `min_players` on the roster.
pub fn can_start(actor: PlayerId, room: &GameRoom) -> Result<(), GameError> {
    ensure_member(actor, room)?;
    if actor != room.creator() {
        return Err(GameError::NotAuthorized(actor));
    }
    if room.phase() != Phase::Waiting {
        return Err(GameError::InvalidPhase(room.phase()));
    }
    let required = room.config().min_players;
    let present = room.player_count();
    if present < required {
        return Err(GameError::NotEnoughPlayers { required, present });
    }
    Ok(())
}

/// Current asker only, while Playing.
pub fn can_ask(actor: PlayerId, room: &GameRoom) -> Result<(), GameError> {
    ensure_member(actor, room)?;
    let phase = room.phase();
    // No turn exists before the game starts.
    if phase == Phase::Waiting {
        return Err(GameError::InvalidPhase(phase));
    }
    if room.current_asker().map(|p| p.id) != Some(actor) {
        return Err(GameError::NotAuthorized(actor));
    }
    if phase != Phase::Playing {
        return Err(GameError::InvalidPhase(phase));
    }
    Ok(())
}

/// The question's receiver only, while QuestionAsked.
pub fn can_select_answer(
    actor: PlayerId,
    room: &GameRoom,
) -> Result<(), GameError> {
    ensure_member(actor, room)?;
    let phase = room.phase();
    match room.current_receiver() {
        Some(receiver) if receiver != actor => {
            Err(GameError::NotAuthorized(actor))
        }
        Some(_) if phase == Phase::QuestionAsked => Ok(()),
        _ => Err(GameError::InvalidPhase(phase)),
    }
}

/// One of the two duelists only, while RpsPending.
pub fn can_submit_rps(
    actor: PlayerId,
    room: &GameRoom,
) -> Result<(), GameError> {
    ensure_member(actor, room)?;
    let Some(participants) = room.rps_participants() else {
        return Err(GameError::InvalidPhase(room.phase()));
    };
    if !participants.contains(&actor) {
        return Err(GameError::InvalidRpsParticipant(actor));
    }
    Ok(())
}

/// Same rule as [`can_ask`]: only the asker may pass on their turn.
pub fn can_skip(actor: PlayerId, room: &GameRoom) -> Result<(), GameError> {
    can_ask(actor, room)
}

fn ensure_member(actor: PlayerId, room: &GameRoom) -> Result<(), GameError> {
    if room.contains(actor) {
        Ok(())
    } else {
        Err(GameError::NotInRoom(actor, room.id().clone()))
    }
}
