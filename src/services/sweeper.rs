//! Reconciliation sweeper background task.
//!
//! Every tick, walks the tracked temporary channels and:
//! - skips channels still inside the grace period,
//! - evicts records whose channel vanished from the platform,
//! - deletes channels nobody occupies, evicting their records.
//!
//! A failed delete leaves the record in place; the next tick retries.

use crate::config::CoreConfig;
use crate::error::GatewayError;
use crate::gateway::{ChannelKind, Gateway};
use crate::state::{ChannelId, GuildId, Lifecycle, TempChannelRecord};
use crate::telemetry::{GatewayTimer, spans};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, info, warn};

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records evicted because the channel no longer exists.
    pub evicted_drift: usize,
    /// Empty channels deleted and evicted.
    pub evicted_empty: usize,
    /// Empty channels whose delete failed (kept for the next tick).
    pub delete_failed: usize,
    /// Records younger than the grace period.
    pub skipped_grace: usize,
    /// Records pointing at a non-voice channel.
    pub skipped_non_voice: usize,
    /// Channels with at least one member.
    pub occupied: usize,
    /// Records left alone because a lookup failed.
    pub lookup_failed: usize,
}

impl SweepReport {
    pub fn evicted(&self) -> usize {
        self.evicted_drift + self.evicted_empty
    }
}

/// Reclaims empty or vanished temporary channels.
pub struct Sweeper {
    lifecycle: Arc<Lifecycle>,
    gateway: Arc<dyn Gateway>,
    config: Arc<CoreConfig>,
}

/// Per-tick cache of occupied channels, fetched at most once per guild.
type OccupancyCache = HashMap<GuildId, Option<HashSet<ChannelId>>>;

impl Sweeper {
    pub fn new(lifecycle: Arc<Lifecycle>, gateway: Arc<dyn Gateway>, config: Arc<CoreConfig>) -> Self {
        Self {
            lifecycle,
            gateway,
            config,
        }
    }

    /// Run one reconciliation pass as of `now`.
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let records = self.lifecycle.snapshot();
        let span = spans::sweep(records.len());
        self.sweep_records(records, now).instrument(span).await
    }

    async fn sweep_records(&self, records: Vec<TempChannelRecord>, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        let mut occupancy = OccupancyCache::new();

        for record in records {
            if record.within_grace(now, self.config.grace_period) {
                report.skipped_grace += 1;
                continue;
            }
            self.check_record(&record, &mut occupancy, &mut report).await;
        }

        if report.evicted() > 0 || report.delete_failed > 0 {
            info!(
                drift = report.evicted_drift,
                empty = report.evicted_empty,
                delete_failed = report.delete_failed,
                "Sweep reclaimed temporary channels"
            );
        }
        report
    }

    async fn check_record(
        &self,
        record: &TempChannelRecord,
        occupancy: &mut OccupancyCache,
        report: &mut SweepReport,
    ) {
        let lookup = {
            let timer = GatewayTimer::new("get_channel");
            let result = self.gateway.get_channel(&record.channel_id).await;
            if let Err(e) = &result
                && !e.is_not_found()
            {
                timer.fail(e);
            }
            result
        };
        match lookup {
            Ok(info) if info.kind != ChannelKind::Voice => {
                debug!(channel = %record.channel_id, kind = ?info.kind, "Tracked channel is not voice, skipping");
                report.skipped_non_voice += 1;
                return;
            }
            Ok(_) => {}
            Err(GatewayError::NotFound) => {
                if self.evict(record, "drift") {
                    report.evicted_drift += 1;
                }
                return;
            }
            Err(e) => {
                warn!(channel = %record.channel_id, error = %e, "Channel lookup failed, retrying next tick");
                report.lookup_failed += 1;
                return;
            }
        }

        let Some(occupied) = self.occupied_channels(&record.guild_id, occupancy).await else {
            report.lookup_failed += 1;
            return;
        };
        if occupied.contains(&record.channel_id) {
            report.occupied += 1;
            return;
        }

        let timer = GatewayTimer::new("delete_channel");
        match self.gateway.delete_channel(&record.channel_id).await {
            Ok(()) => {
                if self.evict(record, "empty") {
                    report.evicted_empty += 1;
                }
            }
            Err(GatewayError::NotFound) => {
                if self.evict(record, "drift") {
                    report.evicted_drift += 1;
                }
            }
            Err(e) => {
                timer.fail(&e);
                warn!(channel = %record.channel_id, error = %e, "Failed to delete empty temporary channel");
                report.delete_failed += 1;
            }
        }
    }

    async fn occupied_channels<'a>(
        &self,
        guild_id: &str,
        cache: &'a mut OccupancyCache,
    ) -> Option<&'a HashSet<ChannelId>> {
        if !cache.contains_key(guild_id) {
            let timer = GatewayTimer::new("guild_voice_occupancy");
            let fetched = match self.gateway.guild_voice_occupancy(guild_id).await {
                Ok(occupants) => Some(occupants.into_iter().map(|o| o.channel_id).collect()),
                Err(e) => {
                    timer.fail(&e);
                    warn!(guild = %guild_id, error = %e, "Voice occupancy lookup failed");
                    None
                }
            };
            cache.insert(guild_id.to_string(), fetched);
        }
        cache.get(guild_id).and_then(Option::as_ref)
    }

    fn evict(&self, record: &TempChannelRecord, reason: &'static str) -> bool {
        let Some(evicted) = self.lifecycle.evict(&record.channel_id) else {
            return false;
        };
        crate::metrics::record_eviction(reason);
        info!(
            guild = %evicted.guild_id,
            channel = %evicted.channel_id,
            number = evicted.number,
            reason,
            "Temporary channel record evicted"
        );
        true
    }
}

/// Spawn the periodic sweeper.
///
/// Runs [`Sweeper::sweep`] every `interval` until shutdown is broadcast.
pub fn spawn_sweeper_task(
    sweeper: Arc<Sweeper>,
    interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; nothing is tracked yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sweeper.sweep(Utc::now()).await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Sweeper received shutdown signal, exiting");
                    break;
                }
            }
        }
    })
}
