#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod errors;
pub mod routes;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod ws;

// Re-exports for public API
pub use config::settings::{GameSettings, GameSettingsPatch};
pub use engine::GameEngine;
pub use error::AppError;
pub use errors::domain::DomainError;
pub use state::app_state::AppState;
pub use store::SessionStore;
pub use ws::hub::ConnectionHub;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    telemetry::init_test_tracing();
}
