use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cards::PlayWindow;

pub type RoomId = i64;
pub type RoundId = i64;
/// Opaque, stable across reconnects.
pub type PlayerId = Uuid;

/// Lifecycle of a room as persisted in the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    Lobby,
    InRound,
    Finished,
}

/// In-flight phase of the active round. Held by the round engine only;
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Prompt bound, pitches being drafted, `pre` cards playable.
    Planning,
    /// Turn-sequenced presentations; `turn` indexes the pitch order.
    Pitching { turn: usize },
    /// The bound investor picks the winner.
    InvestorSelection,
    /// Peer voting; legacy path and investor-less fallback.
    Voting,
    /// Round sealed, waiting out the grace delay before the next round.
    RoundEnd,
}

impl RoundPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            RoundPhase::Planning => PhaseKind::Planning,
            RoundPhase::Pitching { .. } => PhaseKind::Pitching,
            RoundPhase::InvestorSelection => PhaseKind::InvestorSelection,
            RoundPhase::Voting => PhaseKind::Voting,
            RoundPhase::RoundEnd => PhaseKind::RoundEnd,
        }
    }

    /// Venture card window open during this phase, if any.
    pub fn open_window(&self) -> Option<PlayWindow> {
        match self.kind() {
            PhaseKind::Planning => Some(PlayWindow::Pre),
            PhaseKind::Pitching => Some(PlayWindow::Mid),
            PhaseKind::Voting => Some(PlayWindow::Post),
            PhaseKind::InvestorSelection | PhaseKind::RoundEnd => None,
        }
    }
}

/// `RoundPhase` with turn indices erased; used for timer tags and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Planning,
    Pitching,
    InvestorSelection,
    Voting,
    RoundEnd,
}

/// How the round's winner gets decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// The bound investor picks; voting results are the timeout fallback.
    Investor,
    /// Legacy peer-voting rounds with no bound investor.
    Voting,
}

/// Next investor seat in join order, wrapping.
pub fn next_investor_index(current: usize, player_count: usize) -> usize {
    (current + 1) % player_count
}
