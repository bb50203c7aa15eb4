//! Immutable prompt and venture card catalog, loaded once at startup.

use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

/// Phase during which a venture card may legally be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayWindow {
    Pre,
    Mid,
    Post,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptCard {
    pub card_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VentureCard {
    pub card_id: String,
    pub title: String,
    pub text: String,
    pub play_window: PlayWindow,
}

/// Read-only after startup; safe to share without synchronization.
#[derive(Debug, Clone)]
pub struct CardCatalog {
    prompts: Vec<PromptCard>,
    ventures: Vec<VentureCard>,
}

impl CardCatalog {
    pub fn new(prompts: Vec<PromptCard>, ventures: Vec<VentureCard>) -> Self {
        Self { prompts, ventures }
    }

    pub fn builtin() -> Self {
        let prompts = BUILTIN_PROMPTS
            .iter()
            .enumerate()
            .map(|(i, text)| PromptCard {
                card_id: format!("prompt_{}", i + 1),
                text: (*text).to_string(),
            })
            .collect();
        let ventures = BUILTIN_VENTURES
            .iter()
            .enumerate()
            .map(|(i, (title, text, window))| VentureCard {
                card_id: format!("venture_{}", i + 1),
                title: (*title).to_string(),
                text: (*text).to_string(),
                play_window: *window,
            })
            .collect();
        Self::new(prompts, ventures)
    }

    /// Uniform draw; replacement across rounds is acceptable.
    pub fn draw_prompt(&self) -> Option<PromptCard> {
        self.prompts.choose(&mut rand::rng()).cloned()
    }

    /// Deals `count` distinct venture cards from a fresh shuffle.
    pub fn deal_ventures(&self, count: usize) -> Vec<VentureCard> {
        let mut deck = self.ventures.clone();
        deck.shuffle(&mut rand::rng());
        deck.truncate(count);
        deck
    }

    pub fn prompts(&self) -> &[PromptCard] {
        &self.prompts
    }

    pub fn ventures(&self) -> &[VentureCard] {
        &self.ventures
    }
}

const BUILTIN_PROMPTS: &[&str] = &[
    "Pitch an app that solves a problem nobody knew they had.",
    "Pitch a subscription box for a wildly specific audience.",
    "Pitch a gadget that combines two household appliances.",
    "Pitch a social network for exactly one hobby.",
    "Pitch a delivery service for something that should never be delivered.",
    "Pitch a theme restaurant built around a historical event.",
    "Pitch a wearable that tracks something embarrassing.",
    "Pitch an AI assistant for a chore everyone secretly enjoys.",
];

const BUILTIN_VENTURES: &[(&str, &str, PlayWindow)] = &[
    (
        "START-UP",
        "If you have no funding, secure a $2B seed round on the spot.",
        PlayWindow::Pre,
    ),
    (
        "ACQUISITION",
        "Siphon $0.5B from a rival who can afford to lose it.",
        PlayWindow::Post,
    ),
    (
        "PIVOT",
        "Declare that your pitch was about something else all along.",
        PlayWindow::Mid,
    ),
    (
        "HYPE TRAIN",
        "Open your pitch with thirty seconds of pure buzzwords.",
        PlayWindow::Pre,
    ),
    (
        "CRUNCH TIME",
        "Demand an extra round of applause before the next presenter.",
        PlayWindow::Mid,
    ),
    (
        "DUE DILIGENCE",
        "Force a rival to re-justify their numbers before votes are counted.",
        PlayWindow::Post,
    ),
];
