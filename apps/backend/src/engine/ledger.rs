//! Funding ledger: awards, transfers and the game-end target check.
//!
//! Funding is always an integer in $1 units; billion-denominated settings
//! are converted once at this boundary so no float ever reaches a balance.

use crate::config::settings::GameSettings;
use crate::domain::state::PlayerId;
use crate::errors::domain::DomainError;
use crate::store::records::Player;
use crate::store::SessionStore;

/// $1e9 per billion.
pub const UNIT_SCALE: i64 = 1_000_000_000;

/// Award for a voting-resolved round (legacy mode has no configured amount).
pub const LEGACY_VOTE_AWARD: i64 = UNIT_SCALE;

pub fn billions_to_units(billions: f64) -> i64 {
    (billions * UNIT_SCALE as f64).round() as i64
}

#[derive(Clone)]
pub struct FundingLedger {
    store: SessionStore,
}

impl FundingLedger {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Credits `amount` to the player. Not idempotent; callers guard
    /// against repeated awards (the engine's sealed-round check).
    pub fn award(&self, player_id: PlayerId, amount: i64) -> Result<i64, DomainError> {
        if amount < 0 {
            return Err(DomainError::validation("award amount must be non-negative"));
        }
        let player = self.store.update_player(player_id, |p| p.funding += amount)?;
        Ok(player.funding)
    }

    /// Moves `amount` between players; a payer who cannot afford it makes
    /// the whole call a no-op, by design of the card effects.
    pub fn transfer(
        &self,
        from: PlayerId,
        to: PlayerId,
        amount: i64,
    ) -> Result<bool, DomainError> {
        if amount < 0 {
            return Err(DomainError::validation(
                "transfer amount must be non-negative",
            ));
        }
        self.store.transfer_funding(from, to, amount)
    }

    pub fn has_reached_target(player: &Player, settings: &GameSettings) -> bool {
        player.funding >= billions_to_units(settings.funding_target_billion)
    }

    pub fn investment_amount(settings: &GameSettings) -> i64 {
        billions_to_units(settings.investment_amount_billion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn seeded_store() -> (SessionStore, PlayerId, PlayerId) {
        let store = SessionStore::new();
        let host = Uuid::new_v4();
        let other = Uuid::new_v4();
        let room = store.create_room("000000".into(), host, GameSettings::default());
        store
            .create_player(room.id, host, "host".into(), true)
            .unwrap();
        store
            .create_player(room.id, other, "other".into(), false)
            .unwrap();
        (store, host, other)
    }

    #[test]
    fn unit_conversion_rounds_fractional_billions() {
        assert_eq!(billions_to_units(1.0), 1_000_000_000);
        assert_eq!(billions_to_units(0.1), 100_000_000);
        assert_eq!(billions_to_units(5.2), 5_200_000_000);
    }

    #[test]
    fn award_credits_integer_units() {
        let (store, host, _) = seeded_store();
        let ledger = FundingLedger::new(store.clone());
        let balance = ledger.award(host, billions_to_units(1.0)).unwrap();
        assert_eq!(balance, 1_000_000_000);
        assert_eq!(store.player(host).unwrap().funding, 1_000_000_000);
    }

    #[test]
    fn negative_award_is_rejected() {
        let (store, host, _) = seeded_store();
        let ledger = FundingLedger::new(store);
        assert!(ledger.award(host, -1).is_err());
    }

    #[test]
    fn transfer_silently_noops_without_balance() {
        let (store, host, other) = seeded_store();
        let ledger = FundingLedger::new(store.clone());
        assert!(!ledger.transfer(other, host, 500).unwrap());
        assert_eq!(store.player(host).unwrap().funding, 0);
    }

    #[test]
    fn target_check_uses_configured_billions() {
        let (store, host, _) = seeded_store();
        let mut settings = GameSettings::default();
        settings.funding_target_billion = 2.0;
        store
            .update_player(host, |p| p.funding = 1_999_999_999)
            .unwrap();
        let player = store.player(host).unwrap();
        assert!(!FundingLedger::has_reached_target(&player, &settings));
        store
            .update_player(host, |p| p.funding = 2_000_000_000)
            .unwrap();
        let player = store.player(host).unwrap();
        assert!(FundingLedger::has_reached_target(&player, &settings));
    }
}
