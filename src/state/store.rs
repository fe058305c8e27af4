//! In-memory record of live temporary channels.

use super::{ChannelId, GuildId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// One live temporary channel. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempChannelRecord {
    pub channel_id: ChannelId,
    pub guild_id: GuildId,
    /// Slot number, unique within the guild while the record is live.
    pub number: u32,
    pub created_at: DateTime<Utc>,
}

impl TempChannelRecord {
    pub fn new(
        channel_id: impl Into<ChannelId>,
        guild_id: impl Into<GuildId>,
        number: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            guild_id: guild_id.into(),
            number,
            created_at,
        }
    }

    /// Whether the record is younger than `grace` at `now`.
    ///
    /// A `created_at` in the future (clock step backwards) counts as age zero.
    pub fn within_grace(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        let age = now
            .signed_duration_since(self.created_at)
            .to_std()
            .unwrap_or_default();
        age < grace
    }
}

/// Records keyed by channel id.
///
/// Not internally synchronized: every call happens under the
/// [`Lifecycle`](super::Lifecycle) lock.
#[derive(Debug, Default)]
pub struct LifecycleStore {
    records: HashMap<ChannelId, TempChannelRecord>,
}

impl LifecycleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any previous record for the same channel.
    pub fn put(&mut self, record: TempChannelRecord) -> Option<TempChannelRecord> {
        self.records.insert(record.channel_id.clone(), record)
    }

    pub fn get(&self, channel_id: &str) -> Option<&TempChannelRecord> {
        self.records.get(channel_id)
    }

    /// Remove and return the record for `channel_id`, if any.
    pub fn delete(&mut self, channel_id: &str) -> Option<TempChannelRecord> {
        self.records.remove(channel_id)
    }

    /// Snapshot of the guild's records, ordered by slot number.
    ///
    /// Owned copies, so callers may iterate after the lock is released.
    pub fn for_each_in_guild(&self, guild_id: &str) -> Vec<TempChannelRecord> {
        let mut records: Vec<_> = self
            .records
            .values()
            .filter(|r| r.guild_id == guild_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.number);
        records
    }

    pub fn count_in_guild(&self, guild_id: &str) -> usize {
        self.records
            .values()
            .filter(|r| r.guild_id == guild_id)
            .count()
    }

    /// Snapshot of every record, ordered by creation time.
    pub fn snapshot(&self) -> Vec<TempChannelRecord> {
        let mut records: Vec<_> = self.records.values().cloned().collect();
        records.sort_by_key(|r| r.created_at);
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
