//! Room settings bundle and its validation bounds.
//!
//! Settings travel over the wire in camelCase and are attached to a room at
//! creation. The host may patch them while the room is still in the lobby;
//! every mutation re-validates the merged bundle.

use serde::{Deserialize, Serialize};

use crate::errors::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettings {
    /// 3..=12
    pub max_players: u32,
    /// Planning phase length in seconds, 30..=180
    pub pitch_timer_sec: u64,
    /// Per-player presentation length in seconds, 30..=120
    pub presentation_timer_sec: u64,
    /// Award per round in billions, 0.1..=5
    pub investment_amount_billion: f64,
    /// Game ends when a player reaches this many billions, >= 1
    pub funding_target_billion: f64,
    /// Optional round cap; uncapped when absent
    pub max_rounds: Option<u32>,
    /// 1..=5
    pub venture_cards_per_player: usize,
    /// Inert flag kept for wire compatibility; observers are not implemented.
    pub allow_audience_observers: bool,
    /// 15..=60
    pub investor_selection_timer_sec: u64,
    /// 15..=60
    pub voting_timer_sec: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_players: 10,
            pitch_timer_sec: 120,
            presentation_timer_sec: 60,
            investment_amount_billion: 1.0,
            funding_target_billion: 5.0,
            max_rounds: None,
            venture_cards_per_player: 2,
            allow_audience_observers: true,
            investor_selection_timer_sec: 30,
            voting_timer_sec: 30,
        }
    }
}

impl GameSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        fn check<T: PartialOrd + std::fmt::Display>(
            name: &str,
            value: T,
            min: T,
            max: T,
        ) -> Result<(), DomainError> {
            if value < min || value > max {
                return Err(DomainError::validation(format!(
                    "{name} must be between {min} and {max}, got {value}"
                )));
            }
            Ok(())
        }

        check("maxPlayers", self.max_players, 3, 12)?;
        check("pitchTimerSec", self.pitch_timer_sec, 30, 180)?;
        check("presentationTimerSec", self.presentation_timer_sec, 30, 120)?;
        check(
            "investmentAmountBillion",
            self.investment_amount_billion,
            0.1,
            5.0,
        )?;
        if self.funding_target_billion < 1.0 {
            return Err(DomainError::validation(format!(
                "fundingTargetBillion must be at least 1, got {}",
                self.funding_target_billion
            )));
        }
        check(
            "ventureCardsPerPlayer",
            self.venture_cards_per_player,
            1,
            5,
        )?;
        check(
            "investorSelectionTimerSec",
            self.investor_selection_timer_sec,
            15,
            60,
        )?;
        check("votingTimerSec", self.voting_timer_sec, 15, 60)?;
        if let Some(max_rounds) = self.max_rounds {
            if max_rounds == 0 {
                return Err(DomainError::validation(
                    "maxRounds must be at least 1 when set",
                ));
            }
        }
        Ok(())
    }
}

/// Partial settings update as sent by the host; unset fields keep their
/// current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettingsPatch {
    pub max_players: Option<u32>,
    pub pitch_timer_sec: Option<u64>,
    pub presentation_timer_sec: Option<u64>,
    pub investment_amount_billion: Option<f64>,
    pub funding_target_billion: Option<f64>,
    pub max_rounds: Option<u32>,
    pub venture_cards_per_player: Option<usize>,
    pub allow_audience_observers: Option<bool>,
    pub investor_selection_timer_sec: Option<u64>,
    pub voting_timer_sec: Option<u64>,
}

impl GameSettingsPatch {
    pub fn apply(&self, base: &GameSettings) -> GameSettings {
        let mut merged = base.clone();
        if let Some(v) = self.max_players {
            merged.max_players = v;
        }
        if let Some(v) = self.pitch_timer_sec {
            merged.pitch_timer_sec = v;
        }
        if let Some(v) = self.presentation_timer_sec {
            merged.presentation_timer_sec = v;
        }
        if let Some(v) = self.investment_amount_billion {
            merged.investment_amount_billion = v;
        }
        if let Some(v) = self.funding_target_billion {
            merged.funding_target_billion = v;
        }
        if let Some(v) = self.max_rounds {
            merged.max_rounds = Some(v);
        }
        if let Some(v) = self.venture_cards_per_player {
            merged.venture_cards_per_player = v;
        }
        if let Some(v) = self.allow_audience_observers {
            merged.allow_audience_observers = v;
        }
        if let Some(v) = self.investor_selection_timer_sec {
            merged.investor_selection_timer_sec = v;
        }
        if let Some(v) = self.voting_timer_sec {
            merged.voting_timer_sec = v;
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GameSettings::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_bounds_player_count() {
        let mut settings = GameSettings::default();
        settings.max_players = 2;
        assert!(settings.validate().is_err());
        settings.max_players = 13;
        assert!(settings.validate().is_err());
        settings.max_players = 3;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_low_funding_target() {
        let mut settings = GameSettings::default();
        settings.funding_target_billion = 0.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_zero_max_rounds() {
        let mut settings = GameSettings::default();
        settings.max_rounds = Some(0);
        assert!(settings.validate().is_err());
        settings.max_rounds = Some(1);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let base = GameSettings::default();
        let patch = GameSettingsPatch {
            pitch_timer_sec: Some(45),
            ..Default::default()
        };
        let merged = patch.apply(&base);
        assert_eq!(merged.pitch_timer_sec, 45);
        assert_eq!(merged.max_players, base.max_players);
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let merged: GameSettings =
            serde_json::from_str(r#"{"maxPlayers": 4, "votingTimerSec": 20}"#).unwrap();
        assert_eq!(merged.max_players, 4);
        assert_eq!(merged.voting_timer_sec, 20);
        assert_eq!(merged.pitch_timer_sec, 120);
    }
}
