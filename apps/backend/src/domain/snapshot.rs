//! Public view of a room's state, sent as the `GAME_STATE` unicast when a
//! connection joins (or rejoins) a room.

use serde::{Deserialize, Serialize};

use crate::config::settings::GameSettings;
use crate::domain::cards::{PromptCard, VentureCard};
use crate::domain::state::{PlayerId, RoomId, RoomState, RoundId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub room: RoomView,
    pub players: Vec<PlayerView>,
    pub current_round: Option<RoundView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: RoomId,
    pub pin: String,
    pub host_id: PlayerId,
    pub state: RoomState,
    pub settings: GameSettings,
    pub current_round: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub is_judge: bool,
    pub is_investor: bool,
    pub funding: i64,
    pub venture_cards: Vec<VentureCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub id: RoundId,
    pub round_no: u32,
    pub investor_id: Option<PlayerId>,
    pub prompt_card: PromptCard,
    pub venture_plays: Vec<VenturePlayView>,
    pub pitches: Vec<PitchView>,
    pub votes: Vec<VoteView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenturePlayView {
    pub player_id: PlayerId,
    pub card_id: String,
    pub target_player_id: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchView {
    pub player_id: PlayerId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteView {
    pub voter_id: PlayerId,
    pub candidate_id: PlayerId,
}

/// One row of the `GAME_END` standings, sorted by descending funding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub id: PlayerId,
    pub name: String,
    pub funding: i64,
}
