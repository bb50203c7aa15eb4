//! Explicit venture card effect table.
//!
//! Effects are looked up by card title; titles without an entry are no-ops.
//! The enumerated set is deliberate; there is no scripting layer.

/// $2B seed round for a player with zero funding.
pub const BOOTSTRAP_AMOUNT: i64 = 2_000_000_000;
/// $0.5B moved from the target to the actor, if the target can afford it.
pub const ACQUISITION_AMOUNT: i64 = 500_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VentureEffect {
    /// Sets a zero-funding actor to a fixed starting amount.
    Bootstrap { amount: i64 },
    /// Moves a fixed amount from a target player to the actor; requires a
    /// target and silently does nothing if the target cannot afford it.
    Acquisition { amount: i64 },
}

impl VentureEffect {
    pub fn requires_target(&self) -> bool {
        matches!(self, VentureEffect::Acquisition { .. })
    }
}

pub fn effect_for_title(title: &str) -> Option<VentureEffect> {
    match title {
        "START-UP" => Some(VentureEffect::Bootstrap {
            amount: BOOTSTRAP_AMOUNT,
        }),
        "ACQUISITION" => Some(VentureEffect::Acquisition {
            amount: ACQUISITION_AMOUNT,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_titles_resolve() {
        assert_eq!(
            effect_for_title("START-UP"),
            Some(VentureEffect::Bootstrap {
                amount: BOOTSTRAP_AMOUNT
            })
        );
        assert_eq!(
            effect_for_title("ACQUISITION"),
            Some(VentureEffect::Acquisition {
                amount: ACQUISITION_AMOUNT
            })
        );
    }

    #[test]
    fn unknown_titles_are_noops() {
        assert_eq!(effect_for_title("PIVOT"), None);
        assert_eq!(effect_for_title(""), None);
    }

    #[test]
    fn only_acquisition_needs_a_target() {
        assert!(VentureEffect::Acquisition { amount: 1 }.requires_target());
        assert!(!VentureEffect::Bootstrap { amount: 1 }.requires_target());
    }
}
