//! Integration test common infrastructure.
//!
//! Provides an in-memory platform gateway and a harness wiring it to the
//! lobby handler and sweeper.

pub mod gateway;

#[allow(unused_imports)]
pub use gateway::{FakeGateway, Failures};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tempvoice::config::CoreConfig;
use tempvoice::gateway::{ChannelKind, Gateway, VoiceStateEvent};
use tempvoice::handlers::LobbyHandler;
use tempvoice::services::Sweeper;
use tempvoice::state::Lifecycle;

pub const GUILD: &str = "1000";
pub const LOBBY: &str = "1001";
pub const PARENT: &str = "1002";
pub const REFERENCE: &str = "1003";
/// Position of the reference channel in the fake platform.
pub const REFERENCE_POSITION: u32 = 4;

pub fn core_config(max: u32, grace_secs: u64) -> Arc<CoreConfig> {
    Arc::new(CoreConfig {
        lobby_channel_id: LOBBY.to_string(),
        temp_parent_id: PARENT.to_string(),
        position_reference_id: REFERENCE.to_string(),
        name_template: "Voice #{number}".to_string(),
        max_channels_per_guild: max,
        grace_period: Duration::from_secs(grace_secs),
        sweep_interval: Duration::from_secs(10),
    })
}

/// Everything a test needs, sharing one lifecycle and one fake platform.
#[allow(dead_code)]
pub struct Harness {
    pub gateway: Arc<FakeGateway>,
    pub lifecycle: Arc<Lifecycle>,
    pub handler: Arc<LobbyHandler>,
    pub sweeper: Arc<Sweeper>,
    pub config: Arc<CoreConfig>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(max: u32, grace_secs: u64) -> Self {
        let config = core_config(max, grace_secs);
        let gateway = Arc::new(FakeGateway::new());
        gateway.add_channel(LOBBY, GUILD, ChannelKind::Voice, 0);
        gateway.add_channel(PARENT, GUILD, ChannelKind::Category, 3);
        gateway.add_channel(REFERENCE, GUILD, ChannelKind::Voice, REFERENCE_POSITION);

        let lifecycle = Arc::new(Lifecycle::new(max));
        let dyn_gateway: Arc<dyn Gateway> = gateway.clone();
        let handler = Arc::new(LobbyHandler::new(
            Arc::clone(&lifecycle),
            Arc::clone(&dyn_gateway),
            Arc::clone(&config),
        ));
        let sweeper = Arc::new(Sweeper::new(
            Arc::clone(&lifecycle),
            dyn_gateway,
            Arc::clone(&config),
        ));

        Self {
            gateway,
            lifecycle,
            handler,
            sweeper,
            config,
        }
    }
}

/// A member of `GUILD` entering the lobby.
#[allow(dead_code)]
pub fn lobby_join(user: &str) -> VoiceStateEvent {
    VoiceStateEvent {
        guild_id: Some(GUILD.to_string()),
        user_id: user.to_string(),
        channel_id: Some(LOBBY.to_string()),
    }
}

/// `base` shifted by `secs` seconds.
#[allow(dead_code)]
pub fn after(base: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    base + chrono::TimeDelta::seconds(secs)
}

/// Check that the slot table and the store agree for `guild`.
#[allow(dead_code)]
pub fn assert_slots_match_records(lifecycle: &Lifecycle, guild: &str) {
    let mut numbers: Vec<u32> = lifecycle
        .records_in_guild(guild)
        .iter()
        .map(|r| r.number)
        .collect();
    numbers.sort_unstable();
    let before = numbers.len();
    numbers.dedup();
    assert_eq!(before, numbers.len(), "duplicate slot numbers in {guild}");
    assert_eq!(numbers, lifecycle.occupied_slots(guild));
    let max = lifecycle.max_per_guild();
    assert!(numbers.iter().all(|n| (1..=max).contains(n)));
    assert!(numbers.len() <= max as usize);
}
