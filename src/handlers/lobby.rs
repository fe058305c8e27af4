//! Lobby join handler.
//!
//! Reacts to a member entering the lobby voice channel: reconciles the
//! guild's records, reserves a slot, creates a numbered voice channel and
//! moves the member into it.

use crate::config::CoreConfig;
use crate::error::{GatewayError, ProvisionError};
use crate::gateway::{Gateway, VoiceStateEvent};
use crate::state::{ChannelId, Lifecycle, TempChannelRecord};
use crate::telemetry::{GatewayTimer, spans};
use chrono::Utc;
use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};

/// Result of handling one voice state event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Not a lobby join; nothing happened.
    Ignored,
    /// A channel was created and recorded.
    Created {
        channel_id: ChannelId,
        number: u32,
        /// Whether the member ended up in the new channel.
        moved: bool,
    },
    /// Provisioning aborted; no channel and no slot left behind.
    Aborted(ProvisionError),
}

impl ProvisionOutcome {
    /// Static label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Created { .. } => "created",
            Self::Aborted(e) => e.error_code(),
        }
    }
}

/// Provisions temporary channels for members joining the lobby.
pub struct LobbyHandler {
    lifecycle: Arc<Lifecycle>,
    gateway: Arc<dyn Gateway>,
    config: Arc<CoreConfig>,
}

impl LobbyHandler {
    pub fn new(lifecycle: Arc<Lifecycle>, gateway: Arc<dyn Gateway>, config: Arc<CoreConfig>) -> Self {
        Self {
            lifecycle,
            gateway,
            config,
        }
    }

    /// Handle one voice state change.
    ///
    /// Never fails: gateway errors are logged and compensated locally.
    pub async fn handle(&self, event: &VoiceStateEvent) -> ProvisionOutcome {
        let (Some(guild_id), Some(channel_id)) = (&event.guild_id, &event.channel_id) else {
            return ProvisionOutcome::Ignored;
        };
        if *channel_id != self.config.lobby_channel_id {
            return ProvisionOutcome::Ignored;
        }

        let outcome = self
            .provision(guild_id, &event.user_id)
            .instrument(spans::provision(guild_id, &event.user_id))
            .await;
        crate::metrics::record_provision(outcome.label());
        outcome
    }

    async fn provision(&self, guild_id: &str, user_id: &str) -> ProvisionOutcome {
        debug!("Member entered lobby");
        self.reconcile_guild(guild_id).await;

        let number = match self.lifecycle.reserve(guild_id) {
            Ok(number) => number,
            Err(e) => {
                info!(
                    max = self.lifecycle.max_per_guild(),
                    "Guild at temporary channel capacity, not creating"
                );
                return ProvisionOutcome::Aborted(e);
            }
        };

        let name = self.config.channel_name(number);
        let position = self.insert_position().await;

        let created = {
            let timer = GatewayTimer::new("create_channel");
            let result = self
                .gateway
                .create_voice_channel(guild_id, &name, &self.config.temp_parent_id, position)
                .await;
            if let Err(e) = &result {
                timer.fail(e);
            }
            result
        };
        let channel_id = match created {
            Ok(id) => id,
            Err(e) => {
                self.lifecycle.cancel(guild_id, number);
                warn!(number, error = %e, "Failed to create temporary channel, slot released");
                return ProvisionOutcome::Aborted(ProvisionError::CreateFailed(e));
            }
        };

        self.lifecycle.commit(TempChannelRecord::new(
            channel_id.clone(),
            guild_id,
            number,
            Utc::now(),
        ));
        info!(channel = %channel_id, number, name = %name, "Temporary channel created");

        // A failed move keeps the channel; the sweeper reclaims it once empty.
        let moved = {
            let timer = GatewayTimer::new("move_member");
            match self.gateway.move_member(guild_id, user_id, &channel_id).await {
                Ok(()) => true,
                Err(e) => {
                    timer.fail(&e);
                    warn!(channel = %channel_id, error = %e, "Failed to move member into temporary channel");
                    false
                }
            }
        };

        ProvisionOutcome::Created {
            channel_id,
            number,
            moved,
        }
    }

    /// Evict records of this guild whose channel no longer exists.
    ///
    /// Returns how many were evicted. Lookup failures other than not-found
    /// leave the record alone.
    pub async fn reconcile_guild(&self, guild_id: &str) -> usize {
        let mut evicted = 0;
        for record in self.lifecycle.records_in_guild(guild_id) {
            let timer = GatewayTimer::new("get_channel");
            match self.gateway.get_channel(&record.channel_id).await {
                Ok(_) => {}
                Err(GatewayError::NotFound) => {
                    if self.lifecycle.evict(&record.channel_id).is_some() {
                        evicted += 1;
                        crate::metrics::record_eviction("drift");
                        info!(
                            channel = %record.channel_id,
                            number = record.number,
                            "Temporary channel gone from platform, record evicted"
                        );
                    }
                }
                Err(e) => {
                    timer.fail(&e);
                    debug!(channel = %record.channel_id, error = %e, "Existence check failed, keeping record");
                }
            }
        }
        evicted
    }

    /// Position right after the reference channel, or 0 if it can't be read.
    async fn insert_position(&self) -> u32 {
        let timer = GatewayTimer::new("get_channel");
        match self
            .gateway
            .get_channel(&self.config.position_reference_id)
            .await
        {
            Ok(reference) => reference.position.saturating_add(1),
            Err(e) => {
                timer.fail(&e);
                warn!(
                    reference = %self.config.position_reference_id,
                    error = %e,
                    "Position reference lookup failed, using position 0"
                );
                0
            }
        }
    }
}
