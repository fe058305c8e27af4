//! tempvoice - temporary voice channels spawned from a lobby.
//!
//! A member joining the configured lobby channel gets a fresh numbered voice
//! channel and is moved into it. A periodic sweeper deletes those channels
//! once they are empty and past their grace period, and drops records for
//! channels that disappeared from the platform.
//!
//! State lives in memory only and is rebuilt from nothing on every start.

pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod http;
pub mod metrics;
pub mod services;
pub mod state;
pub mod telemetry;

pub use config::{Config, CoreConfig};
pub use error::{GatewayError, ProvisionError};
pub use gateway::{ChannelInfo, ChannelKind, Gateway, VoiceOccupant, VoiceStateEvent};
pub use handlers::{LobbyHandler, ProvisionOutcome};
pub use services::{SweepReport, Sweeper, spawn_sweeper_task};
pub use state::{Lifecycle, TempChannelRecord};
