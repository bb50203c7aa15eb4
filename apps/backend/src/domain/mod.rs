//! Pure game rules: phase machine vocabulary, card catalog, venture card
//! effects and vote resolution. Nothing in here touches the store, the
//! hub or the clock.

pub mod cards;
pub mod effects;
pub mod resolution;
pub mod snapshot;
pub mod state;

pub use cards::{CardCatalog, PlayWindow, PromptCard, VentureCard};
pub use state::{PhaseKind, PlayerId, ResolutionMode, RoomId, RoomState, RoundId, RoundPhase};
