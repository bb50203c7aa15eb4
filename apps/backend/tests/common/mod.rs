//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use backend::config::settings::GameSettings;
use backend::domain::cards::{CardCatalog, PlayWindow, VentureCard};
use backend::domain::state::PhaseKind;
use backend::engine::GameEngine;
use backend::store::SessionStore;
use backend::ws::hub::ConnectionHub;
use backend::ws::protocol::ServerMsg;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

pub const TEST_PIN: &str = "424242";

pub struct TestRoom {
    pub engine: GameEngine,
    pub store: SessionStore,
    pub hub: Arc<ConnectionHub>,
    pub room_id: i64,
    /// Join order; index 0 is the host.
    pub players: Vec<Uuid>,
    /// One bound connection per player, same order as `players`.
    pub receivers: Vec<UnboundedReceiver<ServerMsg>>,
}

impl TestRoom {
    pub fn host(&self) -> Uuid {
        self.players[0]
    }

    pub fn drain(&mut self, idx: usize) -> Vec<ServerMsg> {
        drain(&mut self.receivers[idx])
    }

    pub fn drain_all(&mut self) {
        for rx in &mut self.receivers {
            while rx.try_recv().is_ok() {}
        }
    }
}

pub fn drain(rx: &mut UnboundedReceiver<ServerMsg>) -> Vec<ServerMsg> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

/// Seeds a lobby with `count` players, each holding a bound live connection.
pub async fn seeded_room(count: usize, settings: GameSettings) -> TestRoom {
    let store = SessionStore::new();
    let hub = Arc::new(ConnectionHub::new());
    let engine = GameEngine::new(store.clone(), CardCatalog::builtin(), Arc::clone(&hub));

    let host_id = Uuid::new_v4();
    let room = store.create_room(TEST_PIN.to_string(), host_id, settings);
    let mut players = Vec::new();
    let mut receivers = Vec::new();
    for i in 0..count {
        let player_id = if i == 0 { host_id } else { Uuid::new_v4() };
        store
            .create_player(room.id, player_id, format!("player-{i}"), i == 0)
            .expect("seed player");
        let conn_id = Uuid::new_v4();
        receivers.push(hub.register(conn_id));
        engine
            .join_room(conn_id, player_id, TEST_PIN)
            .await
            .expect("bind connection");
        players.push(player_id);
    }

    TestRoom {
        engine,
        store,
        hub,
        room_id: room.id,
        players,
        receivers,
    }
}

/// Moves the paused clock and lets spawned timer tasks run. Yields before
/// advancing so freshly spawned timers register their deadlines first.
pub async fn advance(duration: Duration) {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    tokio::time::advance(duration).await;
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Drives a 3-player room into a legacy peer-voting round: the investor
/// flag is cleared mid-round-one, so round two starts with no bound
/// investor and resolves by vote.
pub async fn legacy_voting_room() -> TestRoom {
    let mut room = seeded_room(3, GameSettings::default()).await;
    room.engine
        .start_game(room.room_id, room.host())
        .await
        .expect("start game");
    for player in room.players.clone() {
        room.store
            .update_player(player, |p| p.is_investor = false)
            .expect("clear investor flag");
    }

    // Round 1: planning, two pitch turns, selection expires with no choice.
    advance(Duration::from_secs(120)).await;
    advance(Duration::from_secs(65)).await;
    advance(Duration::from_secs(65)).await;
    advance(Duration::from_secs(30)).await;
    // Grace, then round 2 opens without an investor.
    advance(Duration::from_secs(5)).await;
    // Round 2: planning, then all three players take a pitch turn.
    advance(Duration::from_secs(120)).await;
    for _ in 0..3 {
        advance(Duration::from_secs(65)).await;
    }
    assert_eq!(
        room.engine.current_phase(room.room_id).await,
        Some(PhaseKind::Voting),
        "legacy room should be in the voting phase"
    );
    room.drain_all();
    room
}

pub fn startup_card(card_id: &str) -> VentureCard {
    VentureCard {
        card_id: card_id.to_string(),
        title: "START-UP".to_string(),
        text: "Bootstrap grant for unfunded founders".to_string(),
        play_window: PlayWindow::Pre,
    }
}

pub fn acquisition_card(card_id: &str) -> VentureCard {
    VentureCard {
        card_id: card_id.to_string(),
        title: "ACQUISITION".to_string(),
        text: "Hostile takeover of a funded rival".to_string(),
        play_window: PlayWindow::Post,
    }
}
