//! State management module.
//!
//! Holds the lifecycle core: the [`LifecycleStore`] of live temporary
//! channels and the per-guild [`SlotTable`], both behind one lock owned by
//! [`Lifecycle`]. The lobby handler and the sweeper share a `Lifecycle`
//! through an `Arc`; nothing else touches the two structures.
//!
//! Gateway I/O never happens while the lock is held. Every method here is
//! a short synchronous critical section.

mod slots;
mod store;

pub use slots::SlotTable;
pub use store::{LifecycleStore, TempChannelRecord};

use crate::error::ProvisionError;
use parking_lot::Mutex;

/// Platform guild identifier.
pub type GuildId = String;
/// Platform channel identifier.
pub type ChannelId = String;
/// Platform user identifier.
pub type UserId = String;

#[derive(Debug)]
struct LifecycleState {
    store: LifecycleStore,
    slots: SlotTable,
}

/// Shared lock domain over the store and slot table.
///
/// Between [`reserve`](Self::reserve) and [`commit`](Self::commit) a slot is
/// occupied without a record; otherwise the occupied slots of a guild are
/// exactly the numbers of its records.
#[derive(Debug)]
pub struct Lifecycle {
    state: Mutex<LifecycleState>,
}

impl Lifecycle {
    /// Create an empty lifecycle bounded by `max_per_guild` channels per guild.
    pub fn new(max_per_guild: u32) -> Self {
        Self {
            state: Mutex::new(LifecycleState {
                store: LifecycleStore::new(),
                slots: SlotTable::new(max_per_guild),
            }),
        }
    }

    /// Admission check and slot acquisition as one critical section.
    ///
    /// Counts live records *and* pending reservations against the limit, so
    /// concurrent lobby joins can never exceed `max_per_guild`.
    pub fn reserve(&self, guild_id: &str) -> Result<u32, ProvisionError> {
        let mut state = self.state.lock();
        let max = state.slots.max_per_guild() as usize;
        let live = state.store.count_in_guild(guild_id);
        if live >= max || state.slots.count(guild_id) >= max {
            return Err(ProvisionError::AtCapacity);
        }
        state
            .slots
            .acquire(guild_id)
            .ok_or(ProvisionError::AtCapacity)
    }

    /// Give back a slot whose channel was never created.
    pub fn cancel(&self, guild_id: &str, number: u32) {
        self.state.lock().slots.release(guild_id, number);
    }

    /// Record a successfully created channel for a reserved slot.
    pub fn commit(&self, record: TempChannelRecord) {
        let mut state = self.state.lock();
        let slot = (record.guild_id.clone(), record.number);
        if let Some(replaced) = state.store.put(record)
            && (replaced.guild_id.as_str(), replaced.number) != (slot.0.as_str(), slot.1)
        {
            // Same channel id committed twice; its old slot is no longer backed.
            state.slots.release(&replaced.guild_id, replaced.number);
        }
        crate::metrics::set_active_channels(state.store.len());
    }

    /// Remove a record and free its slot.
    ///
    /// Returns the evicted record, or `None` if someone else already removed
    /// it. Only an actual removal releases a slot, so a racing eviction
    /// cannot free a number that has since been handed to a new channel.
    pub fn evict(&self, channel_id: &str) -> Option<TempChannelRecord> {
        let mut state = self.state.lock();
        let record = state.store.delete(channel_id)?;
        state.slots.release(&record.guild_id, record.number);
        crate::metrics::set_active_channels(state.store.len());
        Some(record)
    }

    pub fn get(&self, channel_id: &str) -> Option<TempChannelRecord> {
        self.state.lock().store.get(channel_id).cloned()
    }

    /// Snapshot of one guild's records.
    pub fn records_in_guild(&self, guild_id: &str) -> Vec<TempChannelRecord> {
        self.state.lock().store.for_each_in_guild(guild_id)
    }

    /// Snapshot of every record.
    pub fn snapshot(&self) -> Vec<TempChannelRecord> {
        self.state.lock().store.snapshot()
    }

    /// Occupied slot numbers for a guild, ascending.
    pub fn occupied_slots(&self, guild_id: &str) -> Vec<u32> {
        self.state.lock().slots.occupied(guild_id)
    }

    pub fn count_in_guild(&self, guild_id: &str) -> usize {
        self.state.lock().store.count_in_guild(guild_id)
    }

    pub fn len(&self) -> usize {
        self.state.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().store.is_empty()
    }

    pub fn max_per_guild(&self) -> u32 {
        self.state.lock().slots.max_per_guild()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn commit(lifecycle: &Lifecycle, guild: &str, channel: &str) -> u32 {
        let number = lifecycle.reserve(guild).unwrap();
        lifecycle.commit(TempChannelRecord::new(channel, guild, number, Utc::now()));
        number
    }

    #[test]
    fn reserve_respects_capacity() {
        let lifecycle = Lifecycle::new(2);
        assert_eq!(commit(&lifecycle, "g", "c1"), 1);
        assert_eq!(commit(&lifecycle, "g", "c2"), 2);
        assert_eq!(lifecycle.reserve("g"), Err(ProvisionError::AtCapacity));
        assert_eq!(lifecycle.count_in_guild("g"), 2);
    }

    #[test]
    fn pending_reservations_count_against_capacity() {
        let lifecycle = Lifecycle::new(1);
        let n = lifecycle.reserve("g").unwrap();
        assert_eq!(lifecycle.reserve("g"), Err(ProvisionError::AtCapacity));

        lifecycle.cancel("g", n);
        assert_eq!(lifecycle.reserve("g"), Ok(1));
    }

    #[test]
    fn evict_releases_slot_once() {
        let lifecycle = Lifecycle::new(2);
        commit(&lifecycle, "g", "c1");
        commit(&lifecycle, "g", "c2");

        let evicted = lifecycle.evict("c1").unwrap();
        assert_eq!(evicted.number, 1);
        assert!(lifecycle.evict("c1").is_none());
        assert_eq!(lifecycle.occupied_slots("g"), vec![2]);

        assert_eq!(lifecycle.reserve("g"), Ok(1));
    }

    #[test]
    fn stale_evict_does_not_free_reassigned_number() {
        let lifecycle = Lifecycle::new(1);
        commit(&lifecycle, "g", "old");
        assert!(lifecycle.evict("old").is_some());
        commit(&lifecycle, "g", "new");

        // A second, late eviction of the old channel must not touch slot 1.
        assert!(lifecycle.evict("old").is_none());
        assert_eq!(lifecycle.occupied_slots("g"), vec![1]);
        assert_eq!(lifecycle.get("new").unwrap().number, 1);
    }

    #[test]
    fn slots_match_records_after_commit_and_evict() {
        let lifecycle = Lifecycle::new(3);
        commit(&lifecycle, "g", "a");
        commit(&lifecycle, "g", "b");
        commit(&lifecycle, "g", "c");
        lifecycle.evict("b");

        let mut numbers: Vec<u32> = lifecycle
            .records_in_guild("g")
            .iter()
            .map(|r| r.number)
            .collect();
        numbers.sort_unstable();
        assert_eq!(numbers, lifecycle.occupied_slots("g"));
    }

    #[test]
    fn concurrent_reservations_never_exceed_capacity() {
        let lifecycle = Arc::new(Lifecycle::new(4));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let lifecycle = Arc::clone(&lifecycle);
                std::thread::spawn(move || lifecycle.reserve("g").ok())
            })
            .collect();

        let mut granted: Vec<u32> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect();
        granted.sort_unstable();
        assert_eq!(granted, vec![1, 2, 3, 4]);
    }
}
