//! The room registry: owns every live room and the player → room index.
//!
//! A room comes into existence when the first `join` names an unknown
//! id, and is destroyed in the same call that removes its last player.
//! Nothing else creates or destroys rooms.

use std::collections::HashMap;

use hush_protocol::{Action, Event, PlayerId, Recipient, RoomId, RoomSummary};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{GameError, GameRoom, Outbound, Player, RoomConfig};

/// An event resolved to the concrete player that should receive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub to: PlayerId,
    pub event: Event,
}

/// Owns all rooms. Not thread-safe on its own: it's meant to be owned by
/// exactly one task (see [`spawn_registry`](crate::spawn_registry)).
pub struct RoomRegistry {
    rooms: HashMap<RoomId, GameRoom>,

    /// A player is on at most one roster at a time.
    player_rooms: HashMap<PlayerId, RoomId>,

    config: RoomConfig,

    /// Draws the first asker of each game.
    rng: StdRng,
}

impl RoomRegistry {
    /// Creates an empty registry seeded from the OS.
    pub fn new(config: RoomConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates an empty registry with a fixed seed, for reproducible games.
    pub fn with_seed(config: RoomConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RoomConfig, rng: StdRng) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            config,
            rng,
        }
    }

    /// Returns the room with this id, creating an empty Waiting room
    /// owned by `creator` if there is none. An existing room is returned
    /// unchanged; its original creator is kept.
    pub fn get_or_create(
        &mut self,
        room_id: RoomId,
        room_name: &str,
        creator: PlayerId,
    ) -> &mut GameRoom {
        let config = self.config;
        self.rooms.entry(room_id).or_insert_with_key(|id| {
            tracing::info!(room_id = %id, %creator, "room created");
            GameRoom::new(id.clone(), room_name, creator, config)
        })
    }

    /// Adds a player to a room, creating the room on first join.
    pub fn join(
        &mut self,
        player_id: PlayerId,
        room_id: RoomId,
        room_name: &str,
        display_name: &str,
    ) -> Result<Vec<Delivery>, GameError> {
        if let Some(current) = self.player_rooms.get(&player_id) {
            return Err(GameError::AlreadyInRoom(player_id, current.clone()));
        }

        let room = self.get_or_create(room_id.clone(), room_name, player_id);
        let player = Player::new(player_id, display_name, room_id.clone());
        let outbound = room.add_player(player)?;
        let deliveries = fan_out(room, outbound);

        self.player_rooms.insert(player_id, room_id);
        Ok(deliveries)
    }

    /// Removes a player from whatever room they're in. If that leaves the
    /// room empty, the room is destroyed before this returns.
    ///
    /// Returns `None` if the player wasn't in a room.
    pub fn leave(&mut self, player_id: PlayerId) -> Option<(RoomId, Vec<Delivery>)> {
        let room_id = self.player_rooms.remove(&player_id)?;
        let deliveries = match self.rooms.get_mut(&room_id) {
            Some(room) => {
                let outbound = room.remove_player(player_id).unwrap_or_default();
                fan_out(room, outbound)
            }
            None => {
                tracing::warn!(%room_id, %player_id, "indexed room is missing");
                Vec::new()
            }
        };
        self.remove_if_empty(&room_id);
        Some((room_id, deliveries))
    }

    /// Deletes the room if its roster is empty. Returns `true` if it did.
    pub fn remove_if_empty(&mut self, room_id: &RoomId) -> bool {
        let empty = self.rooms.get(room_id).is_some_and(GameRoom::is_empty);
        if empty {
            self.rooms.remove(room_id);
            tracing::info!(%room_id, "room destroyed");
        }
        empty
    }

    /// Applies one inbound action on behalf of `actor`.
    ///
    /// On error nothing has changed; the caller should tell the actor why.
    pub fn apply(
        &mut self,
        actor: PlayerId,
        action: Action,
    ) -> Result<Vec<Delivery>, GameError> {
        match action {
            Action::Join {
                room_id,
                room_name,
                display_name,
            } => self.join(actor, room_id, &room_name, &display_name),
            Action::Leave => match self.leave(actor) {
                Some((_, deliveries)) => Ok(deliveries),
                None => Ok(Vec::new()),
            },
            Action::StartGame { room_id } => {
                let rng = &mut self.rng;
                let room = Self::member_room(&mut self.rooms, actor, &room_id)?;
                let outbound = room.start_game(actor, rng)?;
                Ok(fan_out(room, outbound))
            }
            Action::AskQuestion {
                room_id,
                question,
                receiver_id,
            } => {
                let room = Self::member_room(&mut self.rooms, actor, &room_id)?;
                let outbound = room.ask_question(actor, question, receiver_id)?;
                Ok(fan_out(room, outbound))
            }
            Action::SelectAnswer {
                room_id,
                answerer_id,
            } => {
                let room = Self::member_room(&mut self.rooms, actor, &room_id)?;
                let outbound = room.select_answer(actor, answerer_id)?;
                Ok(fan_out(room, outbound))
            }
            Action::SubmitRpsChoice { room_id, choice } => {
                let room = Self::member_room(&mut self.rooms, actor, &room_id)?;
                let outbound = room.submit_rps_choice(actor, choice)?;
                Ok(fan_out(room, outbound))
            }
            Action::SkipQuestion { room_id } => {
                let room = Self::member_room(&mut self.rooms, actor, &room_id)?;
                let outbound = room.skip_question(actor)?;
                Ok(fan_out(room, outbound))
            }
        }
    }

    /// Looks up a room the actor is a member of.
    fn member_room<'a>(
        rooms: &'a mut HashMap<RoomId, GameRoom>,
        actor: PlayerId,
        room_id: &RoomId,
    ) -> Result<&'a mut GameRoom, GameError> {
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| GameError::RoomNotFound(room_id.clone()))?;
        if !room.contains(actor) {
            return Err(GameError::NotInRoom(actor, room_id.clone()));
        }
        Ok(room)
    }

    /// A read-only view of every live room, for pre-join discovery.
    pub fn list_summaries(&self) -> impl Iterator<Item = RoomSummary> + '_ {
        self.rooms.values().map(GameRoom::summary)
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&GameRoom> {
        self.rooms.get(room_id)
    }

    /// The room a player is currently in, if any.
    pub fn player_room(&self, player_id: PlayerId) -> Option<&RoomId> {
        self.player_rooms.get(&player_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

/// Resolves each event's audience against the room's current roster.
fn fan_out(room: &GameRoom, outbound: Vec<Outbound>) -> Vec<Delivery> {
    let mut deliveries = Vec::with_capacity(outbound.len());
    for (recipient, event) in outbound {
        match recipient {
            Recipient::All => {
                deliveries.extend(room.players().iter().map(|p| Delivery {
                    to: p.id,
                    event: event.clone(),
                }));
            }
            Recipient::Player(to) => deliveries.push(Delivery { to, event }),
        }
    }
    deliveries
}

#[cfg(test)]
mod tests {
    use super::*;
    use hush_protocol::{Phase, RejectReason, RpsChoice};

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn den() -> RoomId {
        RoomId::from("den")
    }

    fn registry() -> RoomRegistry {
        RoomRegistry::with_seed(RoomConfig::default(), 42)
    }

    fn join(reg: &mut RoomRegistry, id: u64) -> Result<Vec<Delivery>, GameError> {
        reg.join(pid(id), den(), "The Den", &format!("p{id}"))
    }

    /// A registry with players 1..=n in `den`, game started.
    fn started(n: u64) -> RoomRegistry {
        let mut reg = registry();
        for i in 1..=n {
            join(&mut reg, i).unwrap();
        }
        reg.apply(pid(1), Action::StartGame { room_id: den() }).unwrap();
        reg
    }

    #[test]
    fn test_first_join_creates_room_owned_by_joiner() {
        let mut reg = registry();
        join(&mut reg, 7).unwrap();
        let room = reg.room(&den()).unwrap();
        assert_eq!(room.creator(), pid(7));
        assert_eq!(room.phase(), Phase::Waiting);
        assert_eq!(reg.player_room(pid(7)), Some(&den()));
    }

    #[test]
    fn test_get_or_create_keeps_original_creator() {
        let mut reg = registry();
        reg.get_or_create(den(), "The Den", pid(1));
        let room = reg.get_or_create(den(), "Other Name", pid(2));
        assert_eq!(room.creator(), pid(1));
        assert_eq!(room.name(), "The Den");
        assert_eq!(reg.room_count(), 1);
    }

    #[test]
    fn test_join_delivers_room_joined_to_joiner_only() {
        let mut reg = registry();
        join(&mut reg, 1).unwrap();
        let deliveries = join(&mut reg, 2).unwrap();

        let joined: Vec<_> = deliveries
            .iter()
            .filter(|d| matches!(d.event, Event::RoomJoined { .. }))
            .collect();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].to, pid(2));

        let rosters = deliveries
            .iter()
            .filter(|d| matches!(d.event, Event::RosterUpdated { .. }))
            .count();
        assert_eq!(rosters, 2);
    }

    #[test]
    fn test_ninth_join_is_room_full() {
        let mut reg = registry();
        for i in 1..=8 {
            join(&mut reg, i).unwrap();
        }
        assert_eq!(join(&mut reg, 9), Err(GameError::RoomFull(den())));
        assert_eq!(reg.room(&den()).unwrap().player_count(), 8);
        assert_eq!(reg.player_room(pid(9)), None);
    }

    #[test]
    fn test_player_can_be_in_one_room_only() {
        let mut reg = registry();
        join(&mut reg, 1).unwrap();
        let result = reg.join(pid(1), RoomId::from("attic"), "Attic", "p1");
        assert_eq!(result, Err(GameError::AlreadyInRoom(pid(1), den())));
        assert!(reg.room(&RoomId::from("attic")).is_none());
    }

    #[test]
    fn test_room_destroyed_exactly_when_last_player_leaves() {
        let mut reg = registry();
        join(&mut reg, 1).unwrap();
        join(&mut reg, 2).unwrap();

        reg.leave(pid(1));
        assert_eq!(reg.room_count(), 1);

        let (room_id, deliveries) = reg.leave(pid(2)).unwrap();
        assert_eq!(room_id, den());
        assert!(deliveries.is_empty());
        assert_eq!(reg.room_count(), 0);
    }

    #[test]
    fn test_remove_if_empty_keeps_occupied_room() {
        let mut reg = registry();
        join(&mut reg, 1).unwrap();
        assert!(!reg.remove_if_empty(&den()));
        assert!(!reg.remove_if_empty(&RoomId::from("nowhere")));
        assert_eq!(reg.room_count(), 1);
    }

    #[test]
    fn test_rejoin_after_room_destroyed_creates_fresh_room() {
        let mut reg = registry();
        join(&mut reg, 1).unwrap();
        reg.leave(pid(1));
        join(&mut reg, 2).unwrap();
        assert_eq!(reg.room(&den()).unwrap().creator(), pid(2));
    }

    #[test]
    fn test_leave_when_not_in_room() {
        let mut reg = registry();
        assert!(reg.leave(pid(1)).is_none());
        assert_eq!(reg.apply(pid(1), Action::Leave), Ok(Vec::new()));
    }

    #[test]
    fn test_leave_notifies_remaining_players() {
        let mut reg = started(4);
        let (_, deliveries) = reg.leave(pid(4)).unwrap();
        let mut recipients: Vec<_> = deliveries.iter().map(|d| d.to).collect();
        recipients.sort();
        assert_eq!(recipients, vec![pid(1), pid(2), pid(3)]);
        match &deliveries[0].event {
            Event::RosterUpdated { phase, .. } => assert_eq!(*phase, Phase::Waiting),
            other => panic!("expected roster, got {other:?}"),
        }
    }

    #[test]
    fn test_action_on_unknown_room() {
        let mut reg = registry();
        let result = reg.apply(pid(1), Action::StartGame { room_id: den() });
        let err = result.unwrap_err();
        assert_eq!(err, GameError::RoomNotFound(den()));
        assert_eq!(err.reason(), Some(RejectReason::RoomNotFound));
    }

    #[test]
    fn test_action_on_someone_elses_room() {
        let mut reg = started(4);
        reg.join(pid(9), RoomId::from("attic"), "Attic", "p9").unwrap();
        let result = reg.apply(pid(9), Action::SkipQuestion { room_id: den() });
        assert_eq!(result, Err(GameError::NotInRoom(pid(9), den())));
    }

    #[test]
    fn test_question_is_delivered_privately() {
        let mut reg = started(4);
        let room = reg.room(&den()).unwrap();
        let asker = room.current_asker().unwrap().id;
        let receiver = room.players().iter().map(|p| p.id).find(|p| *p != asker).unwrap();

        let deliveries = reg
            .apply(
                asker,
                Action::AskQuestion {
                    room_id: den(),
                    question: "secret?".into(),
                    receiver_id: receiver,
                },
            )
            .unwrap();

        let private: Vec<_> = deliveries
            .iter()
            .filter(|d| matches!(d.event, Event::QuestionDelivered { .. }))
            .map(|d| d.to)
            .collect();
        assert_eq!(private, vec![receiver]);
        let announced = deliveries
            .iter()
            .filter(|d| matches!(d.event, Event::QuestionAnnounced { .. }))
            .count();
        assert_eq!(announced, 4);
    }

    #[test]
    fn test_full_round_through_apply() {
        let mut reg = started(4);
        let room = reg.room(&den()).unwrap();
        let asker = room.current_asker().unwrap().id;
        let mut others = room.players().iter().map(|p| p.id).filter(|p| *p != asker);
        let receiver = others.next().unwrap();
        let answerer = others.next().unwrap();

        let actions = [
            (asker, Action::AskQuestion { room_id: den(), question: "q".into(), receiver_id: receiver }),
            (receiver, Action::SelectAnswer { room_id: den(), answerer_id: answerer }),
            (receiver, Action::SubmitRpsChoice { room_id: den(), choice: RpsChoice::Rock }),
            (answerer, Action::SubmitRpsChoice { room_id: den(), choice: RpsChoice::Scissors }),
        ];
        for (actor, action) in actions {
            reg.apply(actor, action).unwrap();
        }

        let room = reg.room(&den()).unwrap();
        assert_eq!(room.phase(), Phase::Playing);
        assert_eq!(room.history().len(), 1);
        assert_eq!(room.current_asker().unwrap().id, receiver);
    }

    #[test]
    fn test_list_summaries_is_side_effect_free() {
        let mut reg = registry();
        join(&mut reg, 1).unwrap();
        reg.join(pid(2), RoomId::from("attic"), "Attic", "p2").unwrap();

        let mut first: Vec<_> = reg.list_summaries().collect();
        for _ in 0..10 {
            let _ = reg.list_summaries().count();
        }
        let mut again: Vec<_> = reg.list_summaries().collect();

        assert_eq!(first.len(), 2);
        first.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        again.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        assert_eq!(first, again);
        assert_eq!(reg.room_count(), 2);
        assert!(again.iter().all(|s| s.player_count == 1 && s.phase == Phase::Waiting));
    }
}
