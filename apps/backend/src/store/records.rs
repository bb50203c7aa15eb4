//! Persisted record shapes. The session store owns these exclusively;
//! the engine mutates them only through store methods.

use time::OffsetDateTime;

use crate::config::settings::GameSettings;
use crate::domain::cards::{PromptCard, VentureCard};
use crate::domain::state::{PlayerId, RoomId, RoomState, RoundId};

#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    /// 6 decimal digits, unique, human-shareable.
    pub pin: String,
    pub host_id: PlayerId,
    pub state: RoomState,
    pub settings: GameSettings,
    /// 0 while in the lobby; 1-based once the game starts.
    pub current_round_no: u32,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub player_id: PlayerId,
    pub room_id: RoomId,
    pub name: String,
    pub is_host: bool,
    pub is_judge: bool,
    pub is_investor: bool,
    /// Integer funding in $1 units; never negative.
    pub funding: i64,
    pub venture_cards: Vec<VentureCard>,
    pub joined_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct Round {
    pub id: RoundId,
    pub room_id: RoomId,
    /// Monotonic, 1-based, unique per room.
    pub round_no: u32,
    /// Absent in legacy voting-only rounds.
    pub investor_id: Option<PlayerId>,
    pub prompt_card: PromptCard,
    pub venture_plays: Vec<VenturePlay>,
    pub pitches: Vec<Pitch>,
    pub votes: Vec<Vote>,
    pub investor_choice: Option<PlayerId>,
    pub winner_id: Option<PlayerId>,
    pub completed_at: Option<OffsetDateTime>,
}

impl Round {
    pub fn is_sealed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct VenturePlay {
    pub player_id: PlayerId,
    pub card_id: String,
    pub target_player_id: Option<PlayerId>,
}

#[derive(Debug, Clone)]
pub struct Pitch {
    pub player_id: PlayerId,
    pub round_id: RoundId,
    pub content: String,
    pub submitted_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct Vote {
    pub voter_id: PlayerId,
    pub candidate_id: PlayerId,
    pub round_id: RoundId,
    pub cast_at: OffsetDateTime,
}
