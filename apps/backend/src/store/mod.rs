//! In-memory session store.
//!
//! Pure data access. No game rules live here beyond record-level
//! uniqueness (one vote per voter per round, one pitch per player per
//! round, one sealed result per round) which must hold atomically under
//! the store lock regardless of how handlers interleave. Records survive
//! for the process lifetime only.

pub mod records;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::settings::{GameSettings, GameSettingsPatch};
use crate::domain::cards::PromptCard;
use crate::domain::snapshot::{
    GameSnapshot, PitchView, PlayerView, RoomView, RoundView, VenturePlayView, VoteView,
};
use crate::domain::state::{PlayerId, RoomId, RoomState, RoundId};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use records::{Pitch, Player, Room, Round, VenturePlay, Vote};

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    rooms: HashMap<RoomId, Room>,
    players: HashMap<PlayerId, Player>,
    /// Join order per room; standings tie-breaks depend on it.
    room_players: HashMap<RoomId, Vec<PlayerId>>,
    rounds: HashMap<RoundId, Round>,
    room_rounds: HashMap<RoomId, Vec<RoundId>>,
    next_room_id: RoomId,
    next_round_id: RoundId,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- rooms ----

    pub fn create_room(&self, pin: String, host_id: PlayerId, settings: GameSettings) -> Room {
        let mut tables = self.inner.write();
        tables.next_room_id += 1;
        let room = Room {
            id: tables.next_room_id,
            pin,
            host_id,
            state: RoomState::Lobby,
            settings,
            current_round_no: 0,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.rooms.insert(room.id, room.clone());
        tables.room_players.insert(room.id, Vec::new());
        tables.room_rounds.insert(room.id, Vec::new());
        room
    }

    pub fn room(&self, room_id: RoomId) -> Result<Room, DomainError> {
        self.inner
            .read()
            .rooms
            .get(&room_id)
            .cloned()
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Room, format!("room {room_id} not found"))
            })
    }

    pub fn room_by_pin(&self, pin: &str) -> Result<Room, DomainError> {
        self.inner
            .read()
            .rooms
            .values()
            .find(|room| room.pin == pin)
            .cloned()
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Room, format!("no room with PIN {pin}"))
            })
    }

    pub fn pin_in_use(&self, pin: &str) -> bool {
        self.inner.read().rooms.values().any(|room| room.pin == pin)
    }

    pub fn update_room(
        &self,
        room_id: RoomId,
        mutate: impl FnOnce(&mut Room),
    ) -> Result<Room, DomainError> {
        let mut tables = self.inner.write();
        let room = tables.rooms.get_mut(&room_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Room, format!("room {room_id} not found"))
        })?;
        mutate(room);
        Ok(room.clone())
    }

    /// Merges a host patch into the room's settings. Read, merge, validate
    /// and write all happen under one write-lock pass; two concurrent
    /// patches serialize here instead of overwriting each other's fields.
    pub fn merge_settings(
        &self,
        room_id: RoomId,
        patch: &GameSettingsPatch,
    ) -> Result<GameSettings, DomainError> {
        let mut tables = self.inner.write();
        let room = tables.rooms.get_mut(&room_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Room, format!("room {room_id} not found"))
        })?;
        if room.state != RoomState::Lobby {
            return Err(DomainError::invalid_state(
                "cannot update settings after game start",
            ));
        }
        let merged = patch.apply(&room.settings);
        merged.validate()?;
        room.settings = merged.clone();
        Ok(merged)
    }

    // ---- players ----

    pub fn create_player(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        name: String,
        is_host: bool,
    ) -> Result<Player, DomainError> {
        let mut tables = self.inner.write();
        if !tables.rooms.contains_key(&room_id) {
            return Err(DomainError::not_found(
                NotFoundKind::Room,
                format!("room {room_id} not found"),
            ));
        }
        let player = Player {
            player_id,
            room_id,
            name,
            is_host,
            is_judge: false,
            is_investor: false,
            funding: 0,
            venture_cards: Vec::new(),
            joined_at: OffsetDateTime::now_utc(),
        };
        tables.players.insert(player_id, player.clone());
        tables
            .room_players
            .entry(room_id)
            .or_default()
            .push(player_id);
        Ok(player)
    }

    /// Lobby join: the state check, the capacity check and the insert run
    /// under one write-lock pass, so two concurrent joins cannot both see
    /// the last free seat.
    pub fn create_player_checked(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        name: String,
    ) -> Result<Player, DomainError> {
        let mut tables = self.inner.write();
        let room = tables.rooms.get(&room_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Room, format!("room {room_id} not found"))
        })?;
        if room.state != RoomState::Lobby {
            return Err(DomainError::invalid_state("game already in progress"));
        }
        let max_players = room.settings.max_players;
        let occupancy = tables.room_players.get(&room_id).map_or(0, |ids| ids.len());
        if occupancy as u32 >= max_players {
            return Err(DomainError::validation("room is full"));
        }
        let player = Player {
            player_id,
            room_id,
            name,
            is_host: false,
            is_judge: false,
            is_investor: false,
            funding: 0,
            venture_cards: Vec::new(),
            joined_at: OffsetDateTime::now_utc(),
        };
        tables.players.insert(player_id, player.clone());
        tables
            .room_players
            .entry(room_id)
            .or_default()
            .push(player_id);
        Ok(player)
    }

    pub fn player(&self, player_id: PlayerId) -> Result<Player, DomainError> {
        self.inner
            .read()
            .players
            .get(&player_id)
            .cloned()
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Player,
                    format!("player {player_id} not found"),
                )
            })
    }

    /// Players of a room in join order.
    pub fn players_in_room(&self, room_id: RoomId) -> Vec<Player> {
        let tables = self.inner.read();
        tables
            .room_players
            .get(&room_id)
            .into_iter()
            .flatten()
            .filter_map(|id| tables.players.get(id).cloned())
            .collect()
    }

    pub fn update_player(
        &self,
        player_id: PlayerId,
        mutate: impl FnOnce(&mut Player),
    ) -> Result<Player, DomainError> {
        let mut tables = self.inner.write();
        let player = tables.players.get_mut(&player_id).ok_or_else(|| {
            DomainError::not_found(
                NotFoundKind::Player,
                format!("player {player_id} not found"),
            )
        })?;
        mutate(player);
        Ok(player.clone())
    }

    /// Clears the investor flag room-wide and sets it on `player_id`,
    /// atomically. Keeps the at-most-one-investor invariant.
    pub fn set_sole_investor(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<(), DomainError> {
        let mut tables = self.inner.write();
        let member_ids = tables
            .room_players
            .get(&room_id)
            .cloned()
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Room, format!("room {room_id} not found"))
            })?;
        if !member_ids.contains(&player_id) {
            return Err(DomainError::not_found(
                NotFoundKind::Player,
                format!("player {player_id} is not in room {room_id}"),
            ));
        }
        for id in member_ids {
            if let Some(player) = tables.players.get_mut(&id) {
                player.is_investor = id == player_id;
            }
        }
        Ok(())
    }

    /// Moves `amount` from one player to another under a single lock.
    /// Returns `false` without mutating anything if the payer cannot
    /// afford it.
    pub fn transfer_funding(
        &self,
        from: PlayerId,
        to: PlayerId,
        amount: i64,
    ) -> Result<bool, DomainError> {
        let mut tables = self.inner.write();
        let from_balance = tables
            .players
            .get(&from)
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Player, format!("player {from} not found"))
            })?
            .funding;
        if !tables.players.contains_key(&to) {
            return Err(DomainError::not_found(
                NotFoundKind::Player,
                format!("player {to} not found"),
            ));
        }
        if from_balance < amount {
            return Ok(false);
        }
        if let Some(payer) = tables.players.get_mut(&from) {
            payer.funding -= amount;
        }
        if let Some(payee) = tables.players.get_mut(&to) {
            payee.funding += amount;
        }
        Ok(true)
    }

    // ---- rounds ----

    pub fn create_round(
        &self,
        room_id: RoomId,
        round_no: u32,
        investor_id: Option<PlayerId>,
        prompt_card: PromptCard,
    ) -> Result<Round, DomainError> {
        let mut tables = self.inner.write();
        if !tables.rooms.contains_key(&room_id) {
            return Err(DomainError::not_found(
                NotFoundKind::Room,
                format!("room {room_id} not found"),
            ));
        }
        tables.next_round_id += 1;
        let round = Round {
            id: tables.next_round_id,
            room_id,
            round_no,
            investor_id,
            prompt_card,
            venture_plays: Vec::new(),
            pitches: Vec::new(),
            votes: Vec::new(),
            investor_choice: None,
            winner_id: None,
            completed_at: None,
        };
        tables.rounds.insert(round.id, round.clone());
        tables
            .room_rounds
            .entry(room_id)
            .or_default()
            .push(round.id);
        Ok(round)
    }

    pub fn round(&self, round_id: RoundId) -> Result<Round, DomainError> {
        self.inner
            .read()
            .rounds
            .get(&round_id)
            .cloned()
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Round, format!("round {round_id} not found"))
            })
    }

    /// The round whose number matches the room's `current_round_no`.
    pub fn current_round(&self, room_id: RoomId) -> Result<Round, DomainError> {
        let tables = self.inner.read();
        let room = tables.rooms.get(&room_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Room, format!("room {room_id} not found"))
        })?;
        tables
            .room_rounds
            .get(&room_id)
            .into_iter()
            .flatten()
            .filter_map(|id| tables.rounds.get(id))
            .find(|round| round.round_no == room.current_round_no)
            .cloned()
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Round,
                    format!("room {room_id} has no active round"),
                )
            })
    }

    pub fn rounds_in_room(&self, room_id: RoomId) -> Vec<Round> {
        let tables = self.inner.read();
        tables
            .room_rounds
            .get(&room_id)
            .into_iter()
            .flatten()
            .filter_map(|id| tables.rounds.get(id).cloned())
            .collect()
    }

    /// First-write-wins: a second pitch from the same player in the same
    /// round is a conflict.
    pub fn record_pitch(
        &self,
        round_id: RoundId,
        player_id: PlayerId,
        content: String,
    ) -> Result<Pitch, DomainError> {
        let mut tables = self.inner.write();
        let round = tables.rounds.get_mut(&round_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Round, format!("round {round_id} not found"))
        })?;
        if round.pitches.iter().any(|p| p.player_id == player_id) {
            return Err(DomainError::conflict(
                ConflictKind::DuplicatePitch,
                "pitch already submitted for this round",
            ));
        }
        let pitch = Pitch {
            player_id,
            round_id,
            content,
            submitted_at: OffsetDateTime::now_utc(),
        };
        round.pitches.push(pitch.clone());
        Ok(pitch)
    }

    /// At most one vote per `(voter, round)`.
    pub fn record_vote(
        &self,
        round_id: RoundId,
        voter_id: PlayerId,
        candidate_id: PlayerId,
    ) -> Result<Vote, DomainError> {
        let mut tables = self.inner.write();
        let round = tables.rounds.get_mut(&round_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Round, format!("round {round_id} not found"))
        })?;
        if round.votes.iter().any(|v| v.voter_id == voter_id) {
            return Err(DomainError::conflict(
                ConflictKind::DuplicateVote,
                "vote already cast for this round",
            ));
        }
        let vote = Vote {
            voter_id,
            candidate_id,
            round_id,
            cast_at: OffsetDateTime::now_utc(),
        };
        round.votes.push(vote.clone());
        Ok(vote)
    }

    pub fn record_venture_play(
        &self,
        round_id: RoundId,
        play: VenturePlay,
    ) -> Result<(), DomainError> {
        let mut tables = self.inner.write();
        let round = tables.rounds.get_mut(&round_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Round, format!("round {round_id} not found"))
        })?;
        round.venture_plays.push(play);
        Ok(())
    }

    pub fn set_investor_choice(
        &self,
        round_id: RoundId,
        chosen: PlayerId,
    ) -> Result<Round, DomainError> {
        let mut tables = self.inner.write();
        let round = tables.rounds.get_mut(&round_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Round, format!("round {round_id} not found"))
        })?;
        round.investor_choice = Some(chosen);
        Ok(round.clone())
    }

    /// Seals the round exactly once. Returns the round and whether this
    /// call did the sealing; an already-sealed round is returned untouched.
    pub fn seal_round(
        &self,
        round_id: RoundId,
        winner_id: Option<PlayerId>,
    ) -> Result<(Round, bool), DomainError> {
        let mut tables = self.inner.write();
        let round = tables.rounds.get_mut(&round_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Round, format!("round {round_id} not found"))
        })?;
        if round.is_sealed() {
            return Ok((round.clone(), false));
        }
        round.winner_id = winner_id;
        round.completed_at = Some(OffsetDateTime::now_utc());
        Ok((round.clone(), true))
    }

    // ---- views ----

    pub fn snapshot(&self, room_id: RoomId) -> Result<GameSnapshot, DomainError> {
        let room = self.room(room_id)?;
        let players = self
            .players_in_room(room_id)
            .into_iter()
            .map(|p| PlayerView {
                id: p.player_id,
                name: p.name,
                is_host: p.is_host,
                is_judge: p.is_judge,
                is_investor: p.is_investor,
                funding: p.funding,
                venture_cards: p.venture_cards,
            })
            .collect();
        let current_round = self.current_round(room_id).ok().map(|round| RoundView {
            id: round.id,
            round_no: round.round_no,
            investor_id: round.investor_id,
            prompt_card: round.prompt_card,
            venture_plays: round
                .venture_plays
                .into_iter()
                .map(|play| VenturePlayView {
                    player_id: play.player_id,
                    card_id: play.card_id,
                    target_player_id: play.target_player_id,
                })
                .collect(),
            pitches: round
                .pitches
                .into_iter()
                .map(|p| PitchView {
                    player_id: p.player_id,
                    content: p.content,
                })
                .collect(),
            votes: round
                .votes
                .into_iter()
                .map(|v| VoteView {
                    voter_id: v.voter_id,
                    candidate_id: v.candidate_id,
                })
                .collect(),
        });
        Ok(GameSnapshot {
            room: RoomView {
                id: room.id,
                pin: room.pin,
                host_id: room.host_id,
                state: room.state,
                settings: room.settings,
                current_round: room.current_round_no,
            },
            players,
            current_round,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cards::CardCatalog;

    fn prompt() -> PromptCard {
        PromptCard {
            card_id: "prompt_1".into(),
            text: "test prompt".into(),
        }
    }

    fn room_with_players(store: &SessionStore, count: usize) -> (Room, Vec<PlayerId>) {
        let host_id = Uuid::new_v4();
        let room = store.create_room("123456".into(), host_id, GameSettings::default());
        let mut ids = vec![host_id];
        store
            .create_player(room.id, host_id, "host".into(), true)
            .unwrap();
        for i in 1..count {
            let id = Uuid::new_v4();
            store
                .create_player(room.id, id, format!("player{i}"), false)
                .unwrap();
            ids.push(id);
        }
        (room, ids)
    }

    #[test]
    fn players_keep_join_order() {
        let store = SessionStore::new();
        let (room, ids) = room_with_players(&store, 4);
        let listed: Vec<_> = store
            .players_in_room(room.id)
            .into_iter()
            .map(|p| p.player_id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn checked_join_stops_at_capacity() {
        let store = SessionStore::new();
        let host_id = Uuid::new_v4();
        let mut settings = GameSettings::default();
        settings.max_players = 3;
        let room = store.create_room("222222".into(), host_id, settings);
        store
            .create_player(room.id, host_id, "host".into(), true)
            .unwrap();
        store
            .create_player_checked(room.id, Uuid::new_v4(), "p1".into())
            .unwrap();
        store
            .create_player_checked(room.id, Uuid::new_v4(), "p2".into())
            .unwrap();
        let err = store
            .create_player_checked(room.id, Uuid::new_v4(), "late".into())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(store.players_in_room(room.id).len(), 3);
    }

    #[test]
    fn checked_join_closes_with_the_lobby() {
        let store = SessionStore::new();
        let (room, _) = room_with_players(&store, 3);
        store
            .update_room(room.id, |r| r.state = RoomState::InRound)
            .unwrap();
        let err = store
            .create_player_checked(room.id, Uuid::new_v4(), "late".into())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(store.players_in_room(room.id).len(), 3);
    }

    #[test]
    fn settings_merge_builds_on_the_stored_record() {
        let store = SessionStore::new();
        let (room, _) = room_with_players(&store, 3);
        let first = GameSettingsPatch {
            pitch_timer_sec: Some(45),
            ..Default::default()
        };
        store.merge_settings(room.id, &first).unwrap();
        let second = GameSettingsPatch {
            voting_timer_sec: Some(20),
            ..Default::default()
        };
        let merged = store.merge_settings(room.id, &second).unwrap();
        // The second patch lands on top of the first, not on a stale copy.
        assert_eq!(merged.pitch_timer_sec, 45);
        assert_eq!(merged.voting_timer_sec, 20);

        let invalid = GameSettingsPatch {
            max_players: Some(2),
            ..Default::default()
        };
        let err = store.merge_settings(room.id, &invalid).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(store.room(room.id).unwrap().settings.max_players, 10);

        store
            .update_room(room.id, |r| r.state = RoomState::InRound)
            .unwrap();
        let err = store.merge_settings(room.id, &second).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn duplicate_vote_is_a_conflict() {
        let store = SessionStore::new();
        let (room, ids) = room_with_players(&store, 3);
        let round = store.create_round(room.id, 1, Some(ids[0]), prompt()).unwrap();
        store.record_vote(round.id, ids[1], ids[2]).unwrap();
        let err = store.record_vote(round.id, ids[1], ids[0]).unwrap_err();
        assert!(matches!(
            err,
            DomainError::Conflict(ConflictKind::DuplicateVote, _)
        ));
        // tally still shows exactly one vote
        assert_eq!(store.round(round.id).unwrap().votes.len(), 1);
    }

    #[test]
    fn second_pitch_is_a_conflict() {
        let store = SessionStore::new();
        let (room, ids) = room_with_players(&store, 3);
        let round = store.create_round(room.id, 1, Some(ids[0]), prompt()).unwrap();
        store
            .record_pitch(round.id, ids[1], "first".into())
            .unwrap();
        let err = store
            .record_pitch(round.id, ids[1], "second".into())
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Conflict(ConflictKind::DuplicatePitch, _)
        ));
        let round = store.round(round.id).unwrap();
        assert_eq!(round.pitches.len(), 1);
        assert_eq!(round.pitches[0].content, "first");
    }

    #[test]
    fn seal_round_is_idempotent() {
        let store = SessionStore::new();
        let (room, ids) = room_with_players(&store, 3);
        let round = store.create_round(room.id, 1, Some(ids[0]), prompt()).unwrap();
        let (_, sealed) = store.seal_round(round.id, Some(ids[1])).unwrap();
        assert!(sealed);
        let (round, sealed_again) = store.seal_round(round.id, Some(ids[2])).unwrap();
        assert!(!sealed_again);
        assert_eq!(round.winner_id, Some(ids[1]));
    }

    #[test]
    fn sole_investor_flag_is_exclusive() {
        let store = SessionStore::new();
        let (room, ids) = room_with_players(&store, 3);
        store.set_sole_investor(room.id, ids[0]).unwrap();
        store.set_sole_investor(room.id, ids[2]).unwrap();
        let investors: Vec<_> = store
            .players_in_room(room.id)
            .into_iter()
            .filter(|p| p.is_investor)
            .map(|p| p.player_id)
            .collect();
        assert_eq!(investors, vec![ids[2]]);
    }

    #[test]
    fn transfer_is_a_noop_when_unaffordable() {
        let store = SessionStore::new();
        let (_, ids) = room_with_players(&store, 3);
        store
            .update_player(ids[1], |p| p.funding = 100)
            .unwrap();
        assert!(!store.transfer_funding(ids[1], ids[2], 500).unwrap());
        assert_eq!(store.player(ids[1]).unwrap().funding, 100);
        assert_eq!(store.player(ids[2]).unwrap().funding, 0);
        assert!(store.transfer_funding(ids[1], ids[2], 100).unwrap());
        assert_eq!(store.player(ids[2]).unwrap().funding, 100);
    }

    #[test]
    fn snapshot_reflects_current_round() {
        let store = SessionStore::new();
        let (room, ids) = room_with_players(&store, 3);
        let catalog = CardCatalog::builtin();
        store
            .update_room(room.id, |r| {
                r.state = RoomState::InRound;
                r.current_round_no = 1;
            })
            .unwrap();
        let prompt = catalog.draw_prompt().unwrap();
        store
            .create_round(room.id, 1, Some(ids[0]), prompt.clone())
            .unwrap();
        let snapshot = store.snapshot(room.id).unwrap();
        assert_eq!(snapshot.players.len(), 3);
        let round = snapshot.current_round.expect("active round in snapshot");
        assert_eq!(round.round_no, 1);
        assert_eq!(round.prompt_card, prompt);
    }
}
