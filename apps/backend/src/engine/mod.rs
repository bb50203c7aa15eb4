//! Round engine: the authoritative per-room phase state machine.
//!
//! Each active room owns a `RoomFlow` behind its own `tokio::sync::Mutex`;
//! every player action and timer expiration locks that mutex before touching
//! store records, so read-modify-write sequences for one room never
//! interleave. Phase timers are spawned tasks tagged with the round and
//! phase they belong to; a timer that fires after its phase was superseded
//! finds a stale tag and does nothing.

pub mod ledger;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::settings::GameSettingsPatch;
use crate::domain::cards::CardCatalog;
use crate::domain::effects::{self, VentureEffect};
use crate::domain::resolution;
use crate::domain::snapshot::{GameSnapshot, Standing};
use crate::domain::state::{
    next_investor_index, PhaseKind, PlayerId, ResolutionMode, RoomId, RoomState, RoundId,
    RoundPhase,
};
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::store::records::VenturePlay;
use crate::store::SessionStore;
use crate::ws::hub::{ConnectionHub, ConnectionId};
use crate::ws::protocol::{JoinedPlayer, ServerMsg, VoteTallyEntry};
use ledger::FundingLedger;

/// Slack added to each presentation turn, matching the original pacing.
const TURN_BUFFER_SECS: u64 = 5;
/// Pause between a round's results and the next round's planning phase.
const NEXT_ROUND_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct GameEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: SessionStore,
    catalog: CardCatalog,
    hub: Arc<ConnectionHub>,
    ledger: FundingLedger,
    flows: DashMap<RoomId, Arc<Mutex<RoomFlow>>>,
}

/// In-flight state of one room's active round. Never persisted.
struct RoomFlow {
    round_id: RoundId,
    round_no: u32,
    phase: RoundPhase,
    mode: ResolutionMode,
    investor_id: Option<PlayerId>,
    /// Turn order for the pitching phase, fixed at round start (join
    /// order, investor excluded).
    pitch_order: Vec<PlayerId>,
    /// Pitchers who already submitted this round.
    pitched: HashSet<PlayerId>,
    timer: Option<PhaseTimer>,
}

impl RoomFlow {
    fn idle() -> Self {
        Self {
            round_id: 0,
            round_no: 0,
            phase: RoundPhase::RoundEnd,
            mode: ResolutionMode::Investor,
            investor_id: None,
            pitch_order: Vec::new(),
            pitched: HashSet::new(),
            timer: None,
        }
    }

    fn all_pitches_in(&self) -> bool {
        self.pitch_order.iter().all(|p| self.pitched.contains(p))
    }
}

/// Identifies the transition a scheduled timer is allowed to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerTag {
    PlanningExpired { round_id: RoundId },
    TurnExpired { round_id: RoundId, turn: usize },
    SelectionExpired { round_id: RoundId },
    VotingExpired { round_id: RoundId },
    NextRound { round_no: u32 },
}

/// Scheduled transition task; aborted when dropped (i.e. whenever the
/// flow replaces or clears its pending timer).
struct PhaseTimer {
    tag: TimerTag,
    handle: Option<JoinHandle<()>>,
}

impl PhaseTimer {
    /// Consumes the timer without aborting the task. Used by the firing
    /// task itself, which must not cancel its own execution.
    fn disarm(mut self) {
        self.handle = None;
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl GameEngine {
    pub fn new(store: SessionStore, catalog: CardCatalog, hub: Arc<ConnectionHub>) -> Self {
        let ledger = FundingLedger::new(store.clone());
        Self {
            inner: Arc::new(EngineInner {
                store,
                catalog,
                hub,
                ledger,
                flows: DashMap::new(),
            }),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.inner.hub
    }

    pub fn catalog(&self) -> &CardCatalog {
        &self.inner.catalog
    }

    /// Phase of the room's active round, if it has one. Mostly useful to
    /// tests and diagnostics.
    pub async fn current_phase(&self, room_id: RoomId) -> Option<PhaseKind> {
        let flow = self.flow(room_id)?;
        let flow = flow.lock().await;
        Some(flow.phase.kind())
    }

    fn flow(&self, room_id: RoomId) -> Option<Arc<Mutex<RoomFlow>>> {
        self.inner.flows.get(&room_id).map(|entry| entry.value().clone())
    }

    fn active_flow(&self, room_id: RoomId) -> Result<Arc<Mutex<RoomFlow>>, DomainError> {
        self.flow(room_id)
            .ok_or_else(|| DomainError::invalid_state("no active round for this room"))
    }

    // ---- multiplexer-facing ----

    /// Binds a connection to a player in a room and returns the snapshot
    /// for the `GAME_STATE` reply. Safe to call again on reconnect.
    pub async fn join_room(
        &self,
        conn_id: ConnectionId,
        player_id: PlayerId,
        room_pin: &str,
    ) -> Result<GameSnapshot, DomainError> {
        let room = self.inner.store.room_by_pin(room_pin)?;
        let player = self.inner.store.player(player_id)?;
        if player.room_id != room.id {
            return Err(DomainError::not_found(
                NotFoundKind::Player,
                "player not found in this room",
            ));
        }

        self.inner.hub.bind(conn_id, player_id, room.id);
        let snapshot = self.inner.store.snapshot(room.id)?;
        self.inner.hub.broadcast(
            room.id,
            &ServerMsg::PlayerJoined {
                player: JoinedPlayer {
                    id: player.player_id,
                    name: player.name,
                    funding: player.funding,
                },
            },
            Some(conn_id),
        );
        Ok(snapshot)
    }

    // ---- lobby actions ----

    /// Relays a player's readiness to the room. Purely informational; no
    /// game rule consumes it.
    pub fn mark_ready(&self, room_id: RoomId, player_id: PlayerId) {
        self.inner
            .hub
            .broadcast(room_id, &ServerMsg::PlayerReady { player_id }, None);
    }

    pub async fn update_settings(
        &self,
        room_id: RoomId,
        requester: PlayerId,
        patch: &GameSettingsPatch,
    ) -> Result<crate::config::settings::GameSettings, DomainError> {
        let room = self.inner.store.room(room_id)?;
        if room.host_id != requester {
            return Err(DomainError::unauthorized(
                "only the host can update settings",
            ));
        }
        // Merge, validate and write run in one store write-lock pass.
        let merged = self.inner.store.merge_settings(room_id, patch)?;
        self.inner.hub.broadcast(
            room_id,
            &ServerMsg::SettingsUpdated {
                settings: merged.clone(),
            },
            None,
        );
        Ok(merged)
    }

    pub async fn start_game(
        &self,
        room_id: RoomId,
        requester: PlayerId,
    ) -> Result<(), DomainError> {
        let room = self.inner.store.room(room_id)?;
        if room.host_id != requester {
            return Err(DomainError::unauthorized(
                "only the host can start the game",
            ));
        }
        if room.state != RoomState::Lobby {
            return Err(DomainError::invalid_state("game is not in lobby state"));
        }
        let players = self.inner.store.players_in_room(room_id);
        if players.len() < 3 {
            return Err(DomainError::validation(
                "at least 3 players required to start",
            ));
        }

        // Creating the flow entry doubles as the single-start guard.
        let flow_arc = match self.inner.flows.entry(room_id) {
            Entry::Occupied(_) => {
                return Err(DomainError::invalid_state("game already started"))
            }
            Entry::Vacant(vacant) => vacant
                .insert(Arc::new(Mutex::new(RoomFlow::idle())))
                .clone(),
        };
        let mut flow = flow_arc.lock().await;

        let result = self.initialize_game(room_id, &players, &mut flow).await;
        if result.is_err() {
            drop(flow);
            self.inner.flows.remove(&room_id);
        }
        result
    }

    async fn initialize_game(
        &self,
        room_id: RoomId,
        players: &[crate::store::records::Player],
        flow: &mut RoomFlow,
    ) -> Result<(), DomainError> {
        let room = self.inner.store.room(room_id)?;
        let per_player = room.settings.venture_cards_per_player;
        for player in players {
            let hand = self.inner.catalog.deal_ventures(per_player);
            self.inner.store.update_player(player.player_id, move |p| {
                p.venture_cards = hand;
                p.is_investor = false;
            })?;
        }
        // Host opens as the first investor; the role rotates each round.
        self.inner.store.set_sole_investor(room_id, room.host_id)?;
        self.inner.store.update_room(room_id, |r| {
            r.state = RoomState::InRound;
            r.current_round_no = 1;
        })?;
        self.inner
            .hub
            .broadcast(room_id, &ServerMsg::GameStarted, None);
        info!(room_id, players = players.len(), "game started");
        self.start_round(room_id, 1, flow).await
    }

    // ---- round lifecycle ----

    async fn start_round(
        &self,
        room_id: RoomId,
        round_no: u32,
        flow: &mut RoomFlow,
    ) -> Result<(), DomainError> {
        let room = self.inner.store.room(room_id)?;
        if room.state != RoomState::InRound {
            return Err(DomainError::invalid_state("room is not in a round"));
        }
        let players = self.inner.store.players_in_room(room_id);
        if players.is_empty() {
            return Err(DomainError::validation(
                "cannot start a round with no players",
            ));
        }
        // A round without a rotating investor falls back to legacy peer
        // voting: everyone pitches, everyone votes.
        let investor_id = players
            .iter()
            .find(|p| p.is_investor)
            .map(|p| p.player_id);
        let prompt = self
            .inner
            .catalog
            .draw_prompt()
            .ok_or_else(|| DomainError::validation("prompt catalog is empty"))?;
        let round = self
            .inner
            .store
            .create_round(room_id, round_no, investor_id, prompt.clone())?;

        flow.round_id = round.id;
        flow.round_no = round_no;
        flow.phase = RoundPhase::Planning;
        flow.mode = if investor_id.is_some() {
            ResolutionMode::Investor
        } else {
            ResolutionMode::Voting
        };
        flow.investor_id = investor_id;
        flow.pitch_order = players
            .iter()
            .filter(|p| Some(p.player_id) != investor_id)
            .map(|p| p.player_id)
            .collect();
        flow.pitched.clear();

        info!(room_id, round_no, round_id = round.id, "round started");
        self.inner.hub.broadcast(
            room_id,
            &ServerMsg::RoundStart {
                round: round_no,
                prompt_card: prompt,
                investor_id,
            },
            None,
        );
        self.schedule(
            room_id,
            flow,
            TimerTag::PlanningExpired { round_id: round.id },
            Duration::from_secs(room.settings.pitch_timer_sec),
        );
        Ok(())
    }

    async fn begin_pitching(
        &self,
        room_id: RoomId,
        flow: &mut RoomFlow,
    ) -> Result<(), DomainError> {
        self.inner.hub.broadcast(
            room_id,
            &ServerMsg::PitchingPhaseStart {
                round_id: flow.round_id,
            },
            None,
        );
        self.set_turn(room_id, flow, 0).await
    }

    async fn set_turn(
        &self,
        room_id: RoomId,
        flow: &mut RoomFlow,
        turn: usize,
    ) -> Result<(), DomainError> {
        if turn >= flow.pitch_order.len() {
            return self.begin_selection_or_voting(room_id, flow).await;
        }
        let room = self.inner.store.room(room_id)?;
        let player_id = flow.pitch_order[turn];
        flow.phase = RoundPhase::Pitching { turn };
        self.inner.hub.broadcast(
            room_id,
            &ServerMsg::PlayerTurn {
                player_id,
                time_limit: room.settings.presentation_timer_sec,
            },
            None,
        );
        self.schedule(
            room_id,
            flow,
            TimerTag::TurnExpired {
                round_id: flow.round_id,
                turn,
            },
            Duration::from_secs(room.settings.presentation_timer_sec + TURN_BUFFER_SECS),
        );
        Ok(())
    }

    async fn begin_selection_or_voting(
        &self,
        room_id: RoomId,
        flow: &mut RoomFlow,
    ) -> Result<(), DomainError> {
        let room = self.inner.store.room(room_id)?;
        if flow.investor_id.is_some() {
            flow.phase = RoundPhase::InvestorSelection;
            self.inner.hub.broadcast(
                room_id,
                &ServerMsg::InvestorSelectionStart {
                    round_id: flow.round_id,
                    time_limit: room.settings.investor_selection_timer_sec,
                },
                None,
            );
            self.schedule(
                room_id,
                flow,
                TimerTag::SelectionExpired {
                    round_id: flow.round_id,
                },
                Duration::from_secs(room.settings.investor_selection_timer_sec),
            );
        } else {
            flow.phase = RoundPhase::Voting;
            self.inner.hub.broadcast(
                room_id,
                &ServerMsg::VotingPhaseStart {
                    round_id: flow.round_id,
                    time_limit: room.settings.voting_timer_sec,
                },
                None,
            );
            self.schedule(
                room_id,
                flow,
                TimerTag::VotingExpired {
                    round_id: flow.round_id,
                },
                Duration::from_secs(room.settings.voting_timer_sec),
            );
        }
        Ok(())
    }

    /// Resolves and seals the round. Safe to reach twice: a sealed round
    /// short-circuits before any award or broadcast.
    async fn end_round(&self, room_id: RoomId, flow: &mut RoomFlow) -> Result<(), DomainError> {
        flow.timer = None;
        let round = self.inner.store.round(flow.round_id)?;
        if round.is_sealed() {
            return Ok(());
        }

        let tally = resolution::tally_votes(round.votes.iter().map(|v| v.candidate_id));
        let winner = round
            .investor_choice
            .or_else(|| resolution::pick_winner(&tally));
        let (_, newly_sealed) = self.inner.store.seal_round(round.id, winner)?;

        let room = self.inner.store.room(room_id)?;
        if newly_sealed {
            if let Some(winner_id) = winner {
                let amount = match flow.mode {
                    ResolutionMode::Investor => FundingLedger::investment_amount(&room.settings),
                    ResolutionMode::Voting => ledger::LEGACY_VOTE_AWARD,
                };
                let balance = self.inner.ledger.award(winner_id, amount)?;
                info!(
                    room_id,
                    round_no = flow.round_no,
                    winner = %winner_id,
                    amount,
                    balance,
                    "round winner funded"
                );
            }
        }

        flow.phase = RoundPhase::RoundEnd;
        self.inner.hub.broadcast(
            room_id,
            &ServerMsg::RoundEnd {
                winner,
                votes: VoteTallyEntry::from_tally(&tally),
            },
            None,
        );

        let players = self.inner.store.players_in_room(room_id);
        let target_reached = players
            .iter()
            .any(|p| FundingLedger::has_reached_target(p, &room.settings));
        let cap_reached = room
            .settings
            .max_rounds
            .is_some_and(|max| room.current_round_no >= max);
        if target_reached || cap_reached {
            return self.end_game(room_id, flow).await;
        }

        if let Some(current) = players.iter().position(|p| p.is_investor) {
            let next = next_investor_index(current, players.len());
            self.inner
                .store
                .set_sole_investor(room_id, players[next].player_id)?;
        }
        let next_no = room.current_round_no + 1;
        self.inner
            .store
            .update_room(room_id, |r| r.current_round_no = next_no)?;
        self.schedule(
            room_id,
            flow,
            TimerTag::NextRound { round_no: next_no },
            NEXT_ROUND_GRACE,
        );
        Ok(())
    }

    async fn end_game(&self, room_id: RoomId, flow: &mut RoomFlow) -> Result<(), DomainError> {
        flow.timer = None;
        self.inner
            .store
            .update_room(room_id, |r| r.state = RoomState::Finished)?;
        let mut players = self.inner.store.players_in_room(room_id);
        // Stable sort: equal funding keeps join order.
        players.sort_by(|a, b| b.funding.cmp(&a.funding));
        let final_standings = players
            .iter()
            .map(|p| Standing {
                id: p.player_id,
                name: p.name.clone(),
                funding: p.funding,
            })
            .collect();
        self.inner
            .hub
            .broadcast(room_id, &ServerMsg::GameEnd { final_standings }, None);
        info!(room_id, "game ended");
        self.inner.flows.remove(&room_id);
        Ok(())
    }

    // ---- player actions ----

    pub async fn submit_pitch(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        content: String,
    ) -> Result<(), DomainError> {
        let flow_arc = self.active_flow(room_id)?;
        let mut flow = flow_arc.lock().await;
        if flow.phase.kind() != PhaseKind::Planning {
            return Err(DomainError::invalid_state(
                "pitches can only be submitted during planning",
            ));
        }
        if !flow.pitch_order.contains(&player_id) {
            return Err(DomainError::unauthorized(
                "only this round's pitchers can submit a pitch",
            ));
        }
        self.inner
            .store
            .record_pitch(flow.round_id, player_id, content.clone())?;
        flow.pitched.insert(player_id);
        self.inner.hub.broadcast(
            room_id,
            &ServerMsg::PitchSubmitted { player_id, content },
            None,
        );
        if flow.all_pitches_in() {
            flow.timer = None;
            info!(room_id, round_no = flow.round_no, "all pitches in, planning cut short");
            self.begin_pitching(room_id, &mut flow).await?;
        }
        Ok(())
    }

    pub async fn select_investment(
        &self,
        room_id: RoomId,
        chooser: PlayerId,
        chosen: PlayerId,
    ) -> Result<(), DomainError> {
        let flow_arc = self.active_flow(room_id)?;
        let mut flow = flow_arc.lock().await;
        if flow.phase.kind() != PhaseKind::InvestorSelection {
            return Err(DomainError::invalid_state(
                "investment can only be selected during investor selection",
            ));
        }
        if flow.investor_id != Some(chooser) {
            return Err(DomainError::unauthorized(
                "only the investor can make this choice",
            ));
        }
        let candidate = self.inner.store.player(chosen)?;
        if candidate.room_id != room_id || !flow.pitch_order.contains(&chosen) {
            return Err(DomainError::validation(
                "chosen player is not a candidate this round",
            ));
        }

        self.inner.store.set_investor_choice(flow.round_id, chosen)?;
        let room = self.inner.store.room(room_id)?;
        self.inner.hub.broadcast(
            room_id,
            &ServerMsg::InvestmentDecision {
                investor_id: chooser,
                chosen_player_id: chosen,
                amount: FundingLedger::investment_amount(&room.settings),
            },
            None,
        );
        // The choice ends the phase; no reason to wait out the timer.
        self.end_round(room_id, &mut flow).await
    }

    pub async fn cast_vote(
        &self,
        room_id: RoomId,
        voter: PlayerId,
        candidate: PlayerId,
    ) -> Result<(), DomainError> {
        let flow_arc = self.active_flow(room_id)?;
        let mut flow = flow_arc.lock().await;
        if flow.phase.kind() != PhaseKind::Voting {
            return Err(DomainError::invalid_state(
                "votes can only be cast during the voting phase",
            ));
        }
        if voter == candidate {
            return Err(DomainError::validation("cannot vote for yourself"));
        }
        let voter_record = self.inner.store.player(voter)?;
        if voter_record.room_id != room_id {
            return Err(DomainError::not_found(
                NotFoundKind::Player,
                "voter not found in this room",
            ));
        }
        let candidate_record = self.inner.store.player(candidate)?;
        if candidate_record.room_id != room_id || !flow.pitch_order.contains(&candidate) {
            return Err(DomainError::validation(
                "chosen player is not a candidate this round",
            ));
        }

        self.inner.store.record_vote(flow.round_id, voter, candidate)?;
        self.inner.hub.broadcast(
            room_id,
            &ServerMsg::VoteCast {
                voter_id: voter,
                candidate_id: candidate,
            },
            None,
        );

        let votes_in = self.inner.store.round(flow.round_id)?.votes.len();
        if votes_in >= self.inner.store.players_in_room(room_id).len() {
            self.end_round(room_id, &mut flow).await?;
        }
        Ok(())
    }

    pub async fn play_venture_card(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        card_id: &str,
        target: Option<PlayerId>,
    ) -> Result<(), DomainError> {
        let flow_arc = self.active_flow(room_id)?;
        let flow = flow_arc.lock().await;

        let player = self.inner.store.player(player_id)?;
        if player.room_id != room_id {
            return Err(DomainError::not_found(
                NotFoundKind::Player,
                "player not found in this room",
            ));
        }
        let card = player
            .venture_cards
            .iter()
            .find(|c| c.card_id == card_id)
            .cloned()
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Card, "card not found in player's hand")
            })?;
        if flow.phase.open_window() != Some(card.play_window) {
            return Err(DomainError::invalid_state(format!(
                "card with play window {:?} cannot be played now",
                card.play_window
            )));
        }

        let effect = effects::effect_for_title(&card.title);
        // Target validation happens before the card leaves the hand so a
        // rejected play mutates nothing.
        if let Some(effect) = effect {
            if effect.requires_target() {
                let target_id = target.ok_or_else(|| {
                    DomainError::validation("this card requires a target player")
                })?;
                if target_id == player_id {
                    return Err(DomainError::validation("cannot target yourself"));
                }
                let target_record = self.inner.store.player(target_id)?;
                if target_record.room_id != room_id {
                    return Err(DomainError::not_found(
                        NotFoundKind::Player,
                        "target player not found in this room",
                    ));
                }
            }
        }

        // The card leaves the hand now; if the effect no-ops below, the
        // card is still spent.
        self.inner.store.update_player(player_id, |p| {
            p.venture_cards.retain(|c| c.card_id != card_id)
        })?;
        self.inner.store.record_venture_play(
            flow.round_id,
            VenturePlay {
                player_id,
                card_id: card.card_id.clone(),
                target_player_id: target,
            },
        )?;

        match effect {
            Some(VentureEffect::Bootstrap { amount }) => {
                if player.funding == 0 {
                    self.inner.ledger.award(player_id, amount)?;
                }
            }
            Some(VentureEffect::Acquisition { amount }) => {
                if let Some(target_id) = target {
                    self.inner.ledger.transfer(target_id, player_id, amount)?;
                }
            }
            None => {}
        }

        self.inner.hub.broadcast(
            room_id,
            &ServerMsg::VenturePlayed {
                player_id,
                card_id: card.card_id,
                target_player_id: target,
            },
            None,
        );
        Ok(())
    }

    // ---- timers ----

    fn schedule(&self, room_id: RoomId, flow: &mut RoomFlow, tag: TimerTag, delay: Duration) {
        let engine = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.on_timer(room_id, tag).await;
        });
        // Replacing the slot drops (and thereby aborts) any previous timer.
        flow.timer = Some(PhaseTimer {
            tag,
            handle: Some(handle),
        });
    }

    async fn on_timer(&self, room_id: RoomId, tag: TimerTag) {
        // A room that finished or never existed makes expirations no-ops.
        let Some(flow_arc) = self.flow(room_id) else {
            return;
        };
        let mut flow = flow_arc.lock().await;
        match flow.timer.take() {
            Some(timer) if timer.tag == tag => timer.disarm(),
            Some(other) => {
                // Superseded while this task was waiting on the lock.
                flow.timer = Some(other);
                return;
            }
            None => return,
        }

        let result = match tag {
            TimerTag::PlanningExpired { .. } => self.begin_pitching(room_id, &mut flow).await,
            TimerTag::TurnExpired { turn, .. } => {
                self.set_turn(room_id, &mut flow, turn + 1).await
            }
            TimerTag::SelectionExpired { .. } | TimerTag::VotingExpired { .. } => {
                self.end_round(room_id, &mut flow).await
            }
            TimerTag::NextRound { round_no } => {
                let result = self.start_round(room_id, round_no, &mut flow).await;
                if let Err(err) = &result {
                    // Round initialization failed; surface to the host
                    // rather than leaving the room silently stuck.
                    if let Ok(room) = self.inner.store.room(room_id) {
                        self.inner.hub.send_to_player(
                            room_id,
                            room.host_id,
                            &ServerMsg::Error {
                                message: format!("could not start round {round_no}: {err}"),
                            },
                        );
                    }
                }
                result
            }
        };
        if let Err(err) = result {
            warn!(room_id, ?tag, error = %err, "timer-driven transition failed");
        }
    }
}
