//! Platform event handlers.

pub mod lobby;

pub use lobby::{LobbyHandler, ProvisionOutcome};
