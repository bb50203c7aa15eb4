//! Realtime wire protocol. Message tags and field casing match the
//! original party-game client: SCREAMING_SNAKE_CASE `type` tags with
//! camelCase payload fields.

use serde::{Deserialize, Serialize};

use crate::config::settings::{GameSettings, GameSettingsPatch};
use crate::domain::cards::PromptCard;
use crate::domain::resolution::VoteTally;
use crate::domain::snapshot::{GameSnapshot, Standing};
use crate::domain::state::{PlayerId, RoundId};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMsg {
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        player_id: PlayerId,
        room_pin: String,
    },
    /// Lobby readiness signal; relayed to the room as `PLAYER_READY`.
    Ready,
    #[serde(rename_all = "camelCase")]
    StartGame { player_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    PlayVentureCard {
        card_id: String,
        target_player_id: Option<PlayerId>,
    },
    #[serde(rename_all = "camelCase")]
    SubmitPitch { content: String },
    #[serde(rename_all = "camelCase")]
    SelectInvestment { chosen_player_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    CastVote { candidate_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    UpdateSettings { settings: GameSettingsPatch },
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMsg {
    /// Unicast snapshot sent on a successful join.
    #[serde(rename_all = "camelCase")]
    GameState { state: GameSnapshot },

    #[serde(rename_all = "camelCase")]
    PlayerJoined { player: JoinedPlayer },

    #[serde(rename_all = "camelCase")]
    PlayerReady { player_id: PlayerId },

    GameStarted,

    #[serde(rename_all = "camelCase")]
    RoundStart {
        round: u32,
        prompt_card: PromptCard,
        investor_id: Option<PlayerId>,
    },

    #[serde(rename_all = "camelCase")]
    PitchingPhaseStart { round_id: RoundId },

    #[serde(rename_all = "camelCase")]
    PlayerTurn { player_id: PlayerId, time_limit: u64 },

    #[serde(rename_all = "camelCase")]
    InvestorSelectionStart { round_id: RoundId, time_limit: u64 },

    #[serde(rename_all = "camelCase")]
    VotingPhaseStart { round_id: RoundId, time_limit: u64 },

    #[serde(rename_all = "camelCase")]
    PitchSubmitted { player_id: PlayerId, content: String },

    #[serde(rename_all = "camelCase")]
    VenturePlayed {
        player_id: PlayerId,
        card_id: String,
        target_player_id: Option<PlayerId>,
    },

    #[serde(rename_all = "camelCase")]
    InvestmentDecision {
        investor_id: PlayerId,
        chosen_player_id: PlayerId,
        amount: i64,
    },

    #[serde(rename_all = "camelCase")]
    VoteCast {
        voter_id: PlayerId,
        candidate_id: PlayerId,
    },

    #[serde(rename_all = "camelCase")]
    RoundEnd {
        winner: Option<PlayerId>,
        votes: Vec<VoteTallyEntry>,
    },

    #[serde(rename_all = "camelCase")]
    GameEnd { final_standings: Vec<Standing> },

    #[serde(rename_all = "camelCase")]
    SettingsUpdated { settings: GameSettings },

    /// Unicast to the offending connection only.
    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedPlayer {
    pub id: PlayerId,
    pub name: String,
    pub funding: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTallyEntry {
    pub candidate_id: PlayerId,
    pub count: u32,
}

impl VoteTallyEntry {
    pub fn from_tally(tally: &VoteTally) -> Vec<Self> {
        tally
            .iter()
            .map(|(candidate_id, count)| Self {
                candidate_id: *candidate_id,
                count: *count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn client_messages_use_original_tags() {
        let msg: ClientMsg = serde_json::from_str(
            r#"{"type":"CAST_VOTE","candidateId":"9f8b7c6d-1a2b-4c3d-8e9f-0a1b2c3d4e5f"}"#,
        )
        .unwrap();
        assert!(matches!(msg, ClientMsg::CastVote { .. }));
    }

    #[test]
    fn server_messages_serialize_with_camel_case_fields() {
        let msg = ServerMsg::PlayerTurn {
            player_id: Uuid::new_v4(),
            time_limit: 60,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"PLAYER_TURN""#));
        assert!(json.contains(r#""timeLimit":60"#));
    }

    #[test]
    fn ready_carries_no_payload() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"READY"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Ready));
    }

    #[test]
    fn pitch_submitted_carries_the_content() {
        let msg = ServerMsg::PitchSubmitted {
            player_id: Uuid::new_v4(),
            content: "robot baristas".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"PITCH_SUBMITTED""#));
        assert!(json.contains(r#""content":"robot baristas""#));
    }

    #[test]
    fn settings_patch_rides_in_update_settings() {
        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"UPDATE_SETTINGS","settings":{"maxPlayers":4}}"#)
                .unwrap();
        let ClientMsg::UpdateSettings { settings } = msg else {
            panic!("wrong variant");
        };
        assert_eq!(settings.max_players, Some(4));
    }
}
