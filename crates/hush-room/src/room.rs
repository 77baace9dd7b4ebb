//! The per-room turn state machine.
//!
//! A [`GameRoom`] owns its roster, turn pointer, and the state of the
//! round in progress. Every transition goes through a [`gate`] check
//! first; a failed check returns an error before anything is touched.
//!
//! Round-scoped data (the question, receiver, answerer, pending RPS
//! choices) lives *inside* [`RoundState`], so leaving a phase drops it.
//! There is no way for a stale question to survive a demotion to
//! Waiting and resurface in the next game.

use hush_protocol::{
    Event, Phase, PlayerId, PlayerInfo, Recipient, RoomId, RoomSummary,
    RpsChoice, RpsOutcome,
};
use rand::Rng;
use serde::Serialize;

use crate::{gate, rps, GameError, RoomConfig};

/// An outbound event paired with its audience.
pub type Outbound = (Recipient, Event);

// ---------------------------------------------------------------------------
// Roster and round data
// ---------------------------------------------------------------------------

/// A roster entry. Created on join, dropped on leave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub room_id: RoomId,
}

impl Player {
    pub fn new(
        id: PlayerId,
        display_name: impl Into<String>,
        room_id: RoomId,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            room_id,
        }
    }

    /// The public view sent to clients.
    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            display_name: self.display_name.clone(),
            room_id: self.room_id.clone(),
        }
    }
}

/// A question that has been asked but not yet settled by a duel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    /// Who asked. Recorded here because the turn pointer can move
    /// (roster changes) before the round ends.
    pub asker: PlayerId,
    pub receiver: PlayerId,
}

/// Hands submitted so far in the current duel, one slot per duelist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RpsChoices {
    pub receiver: Option<RpsChoice>,
    pub answerer: Option<RpsChoice>,
}

impl RpsChoices {
    /// Number of hands submitted (0, 1 or 2).
    pub fn len(&self) -> usize {
        usize::from(self.receiver.is_some()) + usize::from(self.answerer.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Both hands, receiver first, once both duelists have submitted.
    fn both(&self) -> Option<(RpsChoice, RpsChoice)> {
        Some((self.receiver?, self.answerer?))
    }
}

/// Where the room is in its turn cycle, carrying exactly the data that
/// phase needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundState {
    Waiting,
    Playing,
    QuestionAsked {
        question: Question,
    },
    RpsPending {
        question: Question,
        answerer: PlayerId,
        choices: RpsChoices,
    },
}

impl RoundState {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Waiting => Phase::Waiting,
            Self::Playing => Phase::Playing,
            Self::QuestionAsked { .. } => Phase::QuestionAsked,
            Self::RpsPending { .. } => Phase::RpsPending,
        }
    }
}

/// One settled round. Ties never produce a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundRecord {
    pub question: String,
    pub asker: PlayerId,
    pub receiver: PlayerId,
    pub answerer: PlayerId,
    pub outcome: RpsOutcome,
    pub revealed: bool,
}

// ---------------------------------------------------------------------------
// GameRoom
// ---------------------------------------------------------------------------

/// One room's roster and turn state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRoom {
    id: RoomId,
    name: String,
    /// Fixed at creation, even if the creator later leaves.
    creator: PlayerId,
    config: RoomConfig,
    /// Join order is turn order.
    players: Vec<Player>,
    turn_index: usize,
    round: RoundState,
    history: Vec<RoundRecord>,
}

impl GameRoom {
    /// Creates an empty room in the Waiting phase.
    pub fn new(
        id: RoomId,
        name: impl Into<String>,
        creator: PlayerId,
        config: RoomConfig,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            creator,
            config,
            players: Vec::new(),
            turn_index: 0,
            round: RoundState::Waiting,
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn creator(&self) -> PlayerId {
        self.creator
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn phase(&self) -> Phase {
        self.round.phase()
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    /// The player at the turn pointer. `None` only when the roster is empty.
    pub fn current_asker(&self) -> Option<&Player> {
        self.players.get(self.turn_index)
    }

    pub fn current_question(&self) -> Option<&Question> {
        match &self.round {
            RoundState::QuestionAsked { question }
            | RoundState::RpsPending { question, .. } => Some(question),
            RoundState::Waiting | RoundState::Playing => None,
        }
    }

    pub fn current_receiver(&self) -> Option<PlayerId> {
        self.current_question().map(|q| q.receiver)
    }

    pub fn current_answerer(&self) -> Option<PlayerId> {
        match &self.round {
            RoundState::RpsPending { answerer, .. } => Some(*answerer),
            _ => None,
        }
    }

    /// `[receiver, answerer]` while a duel is pending. The order decides
    /// how the duel is read.
    pub fn rps_participants(&self) -> Option<[PlayerId; 2]> {
        match &self.round {
            RoundState::RpsPending { question, answerer, .. } => {
                Some([question.receiver, *answerer])
            }
            _ => None,
        }
    }

    pub fn rps_choices(&self) -> Option<&RpsChoices> {
        match &self.round {
            RoundState::RpsPending { choices, .. } => Some(choices),
            _ => None,
        }
    }

    /// Settled rounds, oldest first.
    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            player_count: self.players.len(),
            phase: self.phase(),
        }
    }

    /// Snapshot of the roster and turn pointer for the whole room.
    pub fn roster_event(&self) -> Event {
        Event::RosterUpdated {
            players: self.players.iter().map(Player::info).collect(),
            phase: self.phase(),
            turn_index: self.turn_index,
            rps_participants: self
                .rps_participants()
                .map(|p| p.to_vec())
                .unwrap_or_default(),
        }
    }

    // -----------------------------------------------------------------------
    // Roster changes
    // -----------------------------------------------------------------------

    /// Appends a player to the roster (and so to the end of the turn order).
    pub fn add_player(
        &mut self,
        player: Player,
    ) -> Result<Vec<Outbound>, GameError> {
        if self.contains(player.id) {
            return Err(GameError::AlreadyInRoom(player.id, self.id.clone()));
        }
        if self.players.len() >= self.config.max_players {
            return Err(GameError::RoomFull(self.id.clone()));
        }

        let player_id = player.id;
        self.players.push(player);
        tracing::info!(
            room_id = %self.id,
            %player_id,
            players = self.players.len(),
            "player joined"
        );

        Ok(vec![
            (
                Recipient::Player(player_id),
                Event::RoomJoined {
                    room_id: self.id.clone(),
                    room_name: self.name.clone(),
                },
            ),
            (Recipient::All, self.roster_event()),
        ])
    }

    /// Removes a player. Returns `None` if they weren't on the roster.
    ///
    /// The turn pointer keeps pointing at the same asker when someone
    /// earlier in the order leaves; if the asker leaves, the next player
    /// in order inherits the turn. A departing duelist's pending hand is
    /// discarded. An in-flight round is otherwise left as is.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Vec<Outbound>> {
        let index = self.index_of(id)?;
        self.players.remove(index);

        if index < self.turn_index {
            self.turn_index -= 1;
        }
        if self.turn_index >= self.players.len() {
            self.turn_index = 0;
        }

        if let RoundState::RpsPending {
            question,
            answerer,
            choices,
        } = &mut self.round
        {
            if question.receiver == id {
                choices.receiver = None;
            }
            if *answerer == id {
                choices.answerer = None;
            }
        }

        tracing::info!(
            room_id = %self.id,
            player_id = %id,
            players = self.players.len(),
            "player left"
        );

        if self.players.len() < self.config.min_players
            && self.phase() != Phase::Waiting
        {
            self.demote();
        }

        if self.players.is_empty() {
            Some(Vec::new())
        } else {
            Some(vec![(Recipient::All, self.roster_event())])
        }
    }

    /// Forced return to Waiting. Dropping the old round state clears the
    /// question, receiver, answerer and any pending hands.
    fn demote(&mut self) {
        let from = self.phase();
        self.round = RoundState::Waiting;
        tracing::info!(
            room_id = %self.id,
            %from,
            players = self.players.len(),
            "roster below minimum, back to waiting"
        );
    }

    // -----------------------------------------------------------------------
    // Turn transitions
    // -----------------------------------------------------------------------

    /// Waiting → Playing. The first asker is drawn uniformly at random.
    pub fn start_game<R: Rng + ?Sized>(
        &mut self,
        actor: PlayerId,
        rng: &mut R,
    ) -> Result<Vec<Outbound>, GameError> {
        gate::can_start(actor, self)?;

        self.turn_index = rng.random_range(0..self.players.len());
        self.round = RoundState::Playing;

        let current_asker = self.players[self.turn_index].info();
        tracing::info!(
            room_id = %self.id,
            players = self.players.len(),
            turn_index = self.turn_index,
            "game started"
        );

        Ok(vec![(
            Recipient::All,
            Event::GameStarted {
                turn_index: self.turn_index,
                current_asker,
            },
        )])
    }

    /// Playing → QuestionAsked. The question text goes to the receiver
    /// only; the room just learns who asked whom.
    pub fn ask_question(
        &mut self,
        actor: PlayerId,
        text: String,
        receiver: PlayerId,
    ) -> Result<Vec<Outbound>, GameError> {
        gate::can_ask(actor, self)?;
        if !self.contains(receiver) {
            return Err(GameError::InvalidTarget(receiver));
        }

        let asker_name = self.name_of(actor);
        let receiver_name = self.name_of(receiver);
        let delivered = Event::QuestionDelivered {
            question: text.clone(),
            asker_name: asker_name.clone(),
        };

        self.round = RoundState::QuestionAsked {
            question: Question {
                text,
                asker: actor,
                receiver,
            },
        };
        tracing::debug!(
            room_id = %self.id,
            asker = %actor,
            %receiver,
            "question asked"
        );

        Ok(vec![
            (Recipient::Player(receiver), delivered),
            (
                Recipient::All,
                Event::QuestionAnnounced {
                    asker_name,
                    receiver_name,
                },
            ),
        ])
    }

    /// QuestionAsked → RpsPending. The receiver picks who duels them.
    pub fn select_answer(
        &mut self,
        actor: PlayerId,
        answerer: PlayerId,
    ) -> Result<Vec<Outbound>, GameError> {
        gate::can_select_answer(actor, self)?;
        // A duel against yourself could never collect two hands.
        if answerer == actor || !self.contains(answerer) {
            return Err(GameError::InvalidTarget(answerer));
        }

        let phase = self.phase();
        let RoundState::QuestionAsked { question } = &self.round else {
            return Err(GameError::InvalidPhase(phase));
        };
        let question = question.clone();
        let receiver = question.receiver;

        self.round = RoundState::RpsPending {
            question,
            answerer,
            choices: RpsChoices::default(),
        };

        let receiver_name = self.name_of(receiver);
        let answerer_name = self.name_of(answerer);
        tracing::debug!(room_id = %self.id, %receiver, %answerer, "duel started");

        Ok(vec![
            (
                Recipient::All,
                Event::AnswerAnnounced {
                    receiver_name: receiver_name.clone(),
                    answerer_name: answerer_name.clone(),
                },
            ),
            (
                Recipient::Player(answerer),
                Event::RpsChallenge {
                    challenger_name: receiver_name.clone(),
                },
            ),
            (
                Recipient::All,
                Event::RpsStarted {
                    player1_name: receiver_name,
                    player2_name: answerer_name,
                    participants: [receiver, answerer],
                },
            ),
        ])
    }

    /// Records a duelist's hand. Once both hands are in, the duel is
    /// resolved: a tie clears the hands and stays in RpsPending, anything
    /// else settles the round and returns to Playing.
    ///
    /// Submitting again before the opponent replaces the earlier hand.
    pub fn submit_rps_choice(
        &mut self,
        actor: PlayerId,
        choice: RpsChoice,
    ) -> Result<Vec<Outbound>, GameError> {
        gate::can_submit_rps(actor, self)?;

        let phase = self.phase();
        let RoundState::RpsPending {
            question,
            answerer,
            choices,
        } = &mut self.round
        else {
            return Err(GameError::InvalidPhase(phase));
        };

        if actor == question.receiver {
            choices.receiver = Some(choice);
        } else {
            choices.answerer = Some(choice);
        }

        let Some((receiver_choice, answerer_choice)) = choices.both() else {
            tracing::debug!(room_id = %self.id, player_id = %actor, "rps hand submitted");
            return Ok(Vec::new());
        };
        let question = question.clone();
        let answerer = *answerer;

        Ok(self.resolve_duel(question, answerer, receiver_choice, answerer_choice))
    }

    fn resolve_duel(
        &mut self,
        question: Question,
        answerer: PlayerId,
        receiver_choice: RpsChoice,
        answerer_choice: RpsChoice,
    ) -> Vec<Outbound> {
        let receiver = question.receiver;
        let receiver_name = self.name_of(receiver);
        let answerer_name = self.name_of(answerer);

        let outcome = rps::resolve(receiver_choice, answerer_choice);
        let winner = match outcome {
            RpsOutcome::Tie => None,
            RpsOutcome::ReceiverWins => Some(receiver),
            RpsOutcome::AnswererWins => Some(answerer),
        };
        let revealed = outcome.reveals_question();
        let revealed_question = revealed.then(|| question.text.clone());

        match winner {
            None => {
                if let RoundState::RpsPending { choices, .. } = &mut self.round {
                    *choices = RpsChoices::default();
                }
                tracing::debug!(room_id = %self.id, %receiver_choice, "rps tie, replaying");
            }
            Some(winner) => {
                self.history.push(RoundRecord {
                    question: question.text,
                    asker: question.asker,
                    receiver,
                    answerer,
                    outcome,
                    revealed,
                });
                if let Some(index) = self.index_of(winner) {
                    self.turn_index = index;
                }
                self.round = RoundState::Playing;
                tracing::info!(
                    room_id = %self.id,
                    %winner,
                    revealed,
                    rounds = self.history.len(),
                    "round settled"
                );
            }
        }

        let mut out = vec![(
            Recipient::All,
            Event::RpsResolved {
                outcome,
                revealed_question,
                winner,
                next_asker: self.current_asker().map(Player::info),
                receiver_name,
                answerer_name,
                receiver_choice,
                answerer_choice,
            },
        )];
        if winner.is_some() {
            out.push((Recipient::All, self.roster_event()));
        }
        out
    }

    /// Playing → Playing with the turn passed one seat along. No history.
    pub fn skip_question(
        &mut self,
        actor: PlayerId,
    ) -> Result<Vec<Outbound>, GameError> {
        gate::can_skip(actor, self)?;

        self.turn_index = (self.turn_index + 1) % self.players.len();
        let next_asker = self.players[self.turn_index].info();
        tracing::debug!(
            room_id = %self.id,
            turn_index = self.turn_index,
            "turn skipped"
        );

        Ok(vec![(Recipient::All, Event::TurnSkipped { next_asker })])
    }

    fn index_of(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    fn name_of(&self, id: PlayerId) -> String {
        self.player(id)
            .map(|p| p.display_name.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn room_id() -> RoomId {
        RoomId::from("den")
    }

    /// A Waiting room with players 1..=n; player 1 is the creator.
    fn room_with(n: u64) -> GameRoom {
        let mut room = GameRoom::new(room_id(), "The Den", pid(1), RoomConfig::default());
        for i in 1..=n {
            room.add_player(Player::new(pid(i), format!("p{i}"), room_id()))
                .unwrap();
        }
        room
    }

    /// A Playing room with `n` players; returns the room and the asker.
    fn playing(n: u64) -> (GameRoom, PlayerId) {
        let mut room = room_with(n);
        room.start_game(pid(1), &mut StdRng::seed_from_u64(7)).unwrap();
        let asker = room.current_asker().unwrap().id;
        (room, asker)
    }

    /// Some player other than the ones given.
    fn other(room: &GameRoom, not: &[PlayerId]) -> PlayerId {
        room.players()
            .iter()
            .map(|p| p.id)
            .find(|id| !not.contains(id))
            .unwrap()
    }

    /// An RpsPending room; returns (room, asker, receiver, answerer).
    fn dueling(n: u64) -> (GameRoom, PlayerId, PlayerId, PlayerId) {
        let (mut room, asker) = playing(n);
        let receiver = other(&room, &[asker]);
        let answerer = other(&room, &[asker, receiver]);
        room.ask_question(asker, "who snores?".into(), receiver).unwrap();
        room.select_answer(receiver, answerer).unwrap();
        (room, asker, receiver, answerer)
    }

    #[test]
    fn test_new_room_is_waiting_and_empty() {
        let room = GameRoom::new(room_id(), "The Den", pid(9), RoomConfig::default());
        assert_eq!(room.phase(), Phase::Waiting);
        assert!(room.is_empty());
        assert_eq!(room.creator(), pid(9));
        assert!(room.current_asker().is_none());
    }

    #[test]
    fn test_start_game_turn_index_in_range_for_all_roster_sizes() {
        for n in 4..=8 {
            for seed in 0..20 {
                let mut room = room_with(n);
                room.start_game(pid(1), &mut StdRng::seed_from_u64(seed))
                    .unwrap();
                assert_eq!(room.phase(), Phase::Playing);
                assert!(room.turn_index() < n as usize);
            }
        }
    }

    #[test]
    fn test_start_game_does_not_always_pick_first_player() {
        let picked_non_zero = (0..50).any(|seed| {
            let mut room = room_with(6);
            room.start_game(pid(1), &mut StdRng::seed_from_u64(seed))
                .unwrap();
            room.turn_index() != 0
        });
        assert!(picked_non_zero);
    }

    #[test]
    fn test_start_game_emits_game_started() {
        let mut room = room_with(4);
        let out = room.start_game(pid(1), &mut StdRng::seed_from_u64(1)).unwrap();
        match &out[..] {
            [(Recipient::All, Event::GameStarted { turn_index, current_asker })] => {
                assert_eq!(*turn_index, room.turn_index());
                assert_eq!(current_asker.id, room.current_asker().unwrap().id);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_ninth_player_is_rejected_and_roster_unchanged() {
        let mut room = room_with(8);
        let before = room.clone();
        let result = room.add_player(Player::new(pid(9), "p9", room_id()));
        assert_eq!(result, Err(GameError::RoomFull(room_id())));
        assert_eq!(room, before);
    }

    #[test]
    fn test_join_emits_room_joined_then_roster() {
        let mut room = room_with(2);
        let out = room.add_player(Player::new(pid(3), "p3", room_id())).unwrap();
        assert!(matches!(
            &out[0],
            (Recipient::Player(p), Event::RoomJoined { .. }) if *p == pid(3)
        ));
        match &out[1] {
            (Recipient::All, Event::RosterUpdated { players, phase, .. }) => {
                assert_eq!(players.len(), 3);
                assert_eq!(*phase, Phase::Waiting);
            }
            other => panic!("expected roster, got {other:?}"),
        }
    }

    #[test]
    fn test_join_mid_game_appends_to_turn_order() {
        let (mut room, asker) = playing(4);
        room.add_player(Player::new(pid(5), "p5", room_id())).unwrap();
        assert_eq!(room.phase(), Phase::Playing);
        assert_eq!(room.current_asker().unwrap().id, asker);
        assert_eq!(room.players().last().unwrap().id, pid(5));
    }

    #[test]
    fn test_shrink_below_minimum_demotes_for_any_departing_player() {
        for leaver in 1..=4 {
            let (mut room, _) = playing(4);
            room.remove_player(pid(leaver)).unwrap();
            assert_eq!(room.phase(), Phase::Waiting, "leaver {leaver}");
        }
    }

    #[test]
    fn test_demotion_clears_round_fields() {
        let (mut room, _, receiver, answerer) = dueling(4);
        room.submit_rps_choice(receiver, RpsChoice::Rock).unwrap();

        let bystander = other(&room, &[receiver, answerer]);
        room.remove_player(bystander).unwrap();

        assert_eq!(room.phase(), Phase::Waiting);
        assert!(room.current_question().is_none());
        assert!(room.current_receiver().is_none());
        assert!(room.current_answerer().is_none());
        assert!(room.rps_participants().is_none());
        assert!(room.rps_choices().is_none());
    }

    #[test]
    fn test_shrink_that_stays_at_minimum_keeps_playing() {
        let (mut room, _) = playing(5);
        room.remove_player(pid(5)).unwrap();
        assert_eq!(room.phase(), Phase::Playing);
        assert!(room.turn_index() < room.player_count());
    }

    #[test]
    fn test_removing_earlier_player_keeps_same_asker() {
        let mut room = room_with(6);
        room.start_game(pid(1), &mut StdRng::seed_from_u64(3)).unwrap();
        // Walk the turn to the last seat so every other player sits earlier.
        let last = room.players().last().unwrap().id;
        while room.current_asker().unwrap().id != last {
            let asker = room.current_asker().unwrap().id;
            room.skip_question(asker).unwrap();
        }

        room.remove_player(pid(2)).unwrap();
        assert_eq!(room.current_asker().unwrap().id, last);
    }

    #[test]
    fn test_removing_last_seat_asker_wraps_turn() {
        let mut room = room_with(5);
        room.start_game(pid(1), &mut StdRng::seed_from_u64(3)).unwrap();
        while room.turn_index() != 4 {
            let asker = room.current_asker().unwrap().id;
            room.skip_question(asker).unwrap();
        }

        room.remove_player(pid(5)).unwrap();
        assert_eq!(room.turn_index(), 0);
        assert_eq!(room.current_asker().unwrap().id, pid(1));
    }

    #[test]
    fn test_remove_unknown_player_returns_none() {
        let mut room = room_with(4);
        assert!(room.remove_player(pid(42)).is_none());
    }

    #[test]
    fn test_removing_last_player_emits_nothing() {
        let mut room = room_with(1);
        assert_eq!(room.remove_player(pid(1)), Some(Vec::new()));
        assert!(room.is_empty());
    }

    #[test]
    fn test_ask_question_routes_text_to_receiver_only() {
        let (mut room, asker) = playing(4);
        let receiver = other(&room, &[asker]);
        let out = room.ask_question(asker, "secret?".into(), receiver).unwrap();

        assert_eq!(room.phase(), Phase::QuestionAsked);
        assert_eq!(room.current_receiver(), Some(receiver));
        match &out[..] {
            [
                (Recipient::Player(to), Event::QuestionDelivered { question, .. }),
                (Recipient::All, Event::QuestionAnnounced { .. }),
            ] => {
                assert_eq!(*to, receiver);
                assert_eq!(question, "secret?");
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_ask_question_unknown_receiver_is_invalid_target() {
        let (mut room, asker) = playing(4);
        let before = room.clone();
        let result = room.ask_question(asker, "q".into(), pid(99));
        assert_eq!(result, Err(GameError::InvalidTarget(pid(99))));
        assert_eq!(room, before);
    }

    #[test]
    fn test_select_answer_sets_ordered_participants() {
        let (room, _, receiver, answerer) = dueling(4);
        assert_eq!(room.phase(), Phase::RpsPending);
        assert_eq!(room.rps_participants(), Some([receiver, answerer]));
        assert!(room.rps_choices().unwrap().is_empty());
    }

    #[test]
    fn test_select_self_as_answerer_is_invalid_target() {
        let (mut room, asker) = playing(4);
        let receiver = other(&room, &[asker]);
        room.ask_question(asker, "q".into(), receiver).unwrap();
        let before = room.clone();

        let result = room.select_answer(receiver, receiver);
        assert_eq!(result, Err(GameError::InvalidTarget(receiver)));
        assert_eq!(room, before);
    }

    #[test]
    fn test_first_hand_waits_for_opponent() {
        let (mut room, _, receiver, _) = dueling(4);
        let out = room.submit_rps_choice(receiver, RpsChoice::Paper).unwrap();
        assert!(out.is_empty());
        assert_eq!(room.rps_choices().unwrap().len(), 1);
        assert_eq!(room.phase(), Phase::RpsPending);
    }

    #[test]
    fn test_resubmitting_replaces_hand() {
        let (mut room, _, receiver, _) = dueling(4);
        room.submit_rps_choice(receiver, RpsChoice::Paper).unwrap();
        room.submit_rps_choice(receiver, RpsChoice::Rock).unwrap();
        let choices = room.rps_choices().unwrap();
        assert_eq!(choices.receiver, Some(RpsChoice::Rock));
        assert_eq!(choices.len(), 1);
    }

    #[test]
    fn test_tie_clears_hands_and_stays_pending() {
        let (mut room, asker, receiver, answerer) = dueling(4);
        room.submit_rps_choice(receiver, RpsChoice::Rock).unwrap();
        let out = room.submit_rps_choice(answerer, RpsChoice::Rock).unwrap();

        assert_eq!(room.phase(), Phase::RpsPending);
        assert!(room.rps_choices().unwrap().is_empty());
        assert_eq!(room.rps_participants(), Some([receiver, answerer]));
        assert!(room.history().is_empty());
        assert_eq!(room.current_asker().unwrap().id, asker);

        match &out[..] {
            [(Recipient::All, Event::RpsResolved { outcome, winner, revealed_question, .. })] => {
                assert_eq!(*outcome, RpsOutcome::Tie);
                assert!(winner.is_none());
                assert!(revealed_question.is_none());
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_receiver_win_keeps_question_secret() {
        let (mut room, asker, receiver, answerer) = dueling(5);
        room.submit_rps_choice(receiver, RpsChoice::Rock).unwrap();
        let out = room.submit_rps_choice(answerer, RpsChoice::Scissors).unwrap();

        assert_eq!(room.phase(), Phase::Playing);
        assert_eq!(room.current_asker().unwrap().id, receiver);
        assert_eq!(
            room.history(),
            &[RoundRecord {
                question: "who snores?".into(),
                asker,
                receiver,
                answerer,
                outcome: RpsOutcome::ReceiverWins,
                revealed: false,
            }]
        );
        match &out[0] {
            (_, Event::RpsResolved { revealed_question, winner, .. }) => {
                assert!(revealed_question.is_none());
                assert_eq!(*winner, Some(receiver));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(out[1], (Recipient::All, Event::RosterUpdated { .. })));
    }

    #[test]
    fn test_answerer_win_reveals_question() {
        let (mut room, _, receiver, answerer) = dueling(5);
        room.submit_rps_choice(answerer, RpsChoice::Paper).unwrap();
        let out = room.submit_rps_choice(receiver, RpsChoice::Rock).unwrap();

        assert_eq!(room.current_asker().unwrap().id, answerer);
        assert!(room.history()[0].revealed);
        match &out[0] {
            (_, Event::RpsResolved { revealed_question, next_asker, receiver_choice, answerer_choice, .. }) => {
                assert_eq!(revealed_question.as_deref(), Some("who snores?"));
                assert_eq!(next_asker.as_ref().unwrap().id, answerer);
                assert_eq!(*receiver_choice, RpsChoice::Rock);
                assert_eq!(*answerer_choice, RpsChoice::Paper);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_resolution_resets_round_fields() {
        let (mut room, _, receiver, answerer) = dueling(4);
        room.submit_rps_choice(receiver, RpsChoice::Scissors).unwrap();
        room.submit_rps_choice(answerer, RpsChoice::Paper).unwrap();
        assert_eq!(room.round(), &RoundState::Playing);
        assert!(room.rps_participants().is_none());
    }

    #[test]
    fn test_history_counts_only_decisive_duels() {
        let (mut room, _) = playing(4);
        let mut decisive = 0;
        let hands = [
            (RpsChoice::Rock, RpsChoice::Rock),
            (RpsChoice::Rock, RpsChoice::Paper),
            (RpsChoice::Paper, RpsChoice::Paper),
            (RpsChoice::Scissors, RpsChoice::Paper),
        ];
        for (r, a) in hands {
            if room.phase() == Phase::Playing {
                let asker = room.current_asker().unwrap().id;
                let receiver = other(&room, &[asker]);
                let answerer = other(&room, &[asker, receiver]);
                room.ask_question(asker, "q".into(), receiver).unwrap();
                room.select_answer(receiver, answerer).unwrap();
            }
            let [receiver, answerer] = room.rps_participants().unwrap();
            room.submit_rps_choice(receiver, r).unwrap();
            room.submit_rps_choice(answerer, a).unwrap();
            if r != a {
                decisive += 1;
            }
            assert_eq!(room.history().len(), decisive);
        }
    }

    #[test]
    fn test_skip_advances_turn_by_one_and_wraps() {
        let (mut room, _) = playing(4);
        for _ in 0..9 {
            let before = room.turn_index();
            let asker = room.current_asker().unwrap().id;
            let out = room.skip_question(asker).unwrap();
            assert_eq!(room.turn_index(), (before + 1) % 4);
            assert!(matches!(out[0], (Recipient::All, Event::TurnSkipped { .. })));
        }
        assert!(room.history().is_empty());
        assert_eq!(room.phase(), Phase::Playing);
    }

    #[test]
    fn test_departing_duelist_hand_is_discarded() {
        let (mut room, _, receiver, answerer) = dueling(5);
        room.submit_rps_choice(answerer, RpsChoice::Rock).unwrap();
        room.remove_player(answerer).unwrap();

        // Still five-minus-one players, so the room stays in the duel.
        assert_eq!(room.phase(), Phase::RpsPending);
        assert!(room.rps_choices().unwrap().is_empty());

        // The remaining duelist alone can never settle the round.
        let out = room.submit_rps_choice(receiver, RpsChoice::Paper).unwrap();
        assert!(out.is_empty());
        assert!(room.history().is_empty());
    }

    #[test]
    fn test_rejected_actions_leave_room_untouched() {
        let (mut room, asker, receiver, answerer) = dueling(4);
        let bystander = other(&room, &[asker, receiver, answerer]);
        let before = room.clone();

        assert!(room.skip_question(asker).is_err());
        assert!(room.ask_question(asker, "again".into(), bystander).is_err());
        assert!(room.select_answer(receiver, bystander).is_err());
        assert!(room.submit_rps_choice(bystander, RpsChoice::Rock).is_err());
        assert!(room.start_game(pid(1), &mut StdRng::seed_from_u64(0)).is_err());

        assert_eq!(room, before);
    }
}
