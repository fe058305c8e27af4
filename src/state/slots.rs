//! Per-guild slot allocation for temporary channel numbers.

use super::GuildId;
use std::collections::{BTreeSet, HashMap};

/// Occupied channel numbers, per guild.
///
/// Numbers are drawn from `1..=max_per_guild` with ascending first-fit, so
/// low numbers are reused first. `acquire` marks the number occupied in the
/// same call that finds it (reserve-then-use). Not internally synchronized:
/// callers hold the [`Lifecycle`](super::Lifecycle) lock.
#[derive(Debug)]
pub struct SlotTable {
    max_per_guild: u32,
    occupied: HashMap<GuildId, BTreeSet<u32>>,
}

impl SlotTable {
    /// Create an empty table bounded by `max_per_guild` slots per guild.
    pub fn new(max_per_guild: u32) -> Self {
        Self {
            max_per_guild,
            occupied: HashMap::new(),
        }
    }

    /// Upper bound on slots per guild.
    pub fn max_per_guild(&self) -> u32 {
        self.max_per_guild
    }

    /// Reserve the lowest free number for `guild`.
    ///
    /// Returns `None` when every slot is taken; that is the capacity signal,
    /// not an error.
    pub fn acquire(&mut self, guild: &str) -> Option<u32> {
        let taken = self.occupied.entry(guild.to_string()).or_default();
        let number = (1..=self.max_per_guild).find(|n| !taken.contains(n));
        match number {
            Some(n) => {
                taken.insert(n);
            }
            None if taken.is_empty() => {
                // max_per_guild == 0; don't leave an empty entry behind
                self.occupied.remove(guild);
            }
            None => {}
        }
        number
    }

    /// Free `number` in `guild`. Returns whether it was occupied.
    ///
    /// Releasing a free number is a no-op.
    pub fn release(&mut self, guild: &str, number: u32) -> bool {
        let Some(taken) = self.occupied.get_mut(guild) else {
            return false;
        };
        let was_taken = taken.remove(&number);
        if taken.is_empty() {
            self.occupied.remove(guild);
        }
        was_taken
    }

    pub fn is_occupied(&self, guild: &str, number: u32) -> bool {
        self.occupied
            .get(guild)
            .is_some_and(|taken| taken.contains(&number))
    }

    /// Occupied numbers for `guild`, ascending.
    pub fn occupied(&self, guild: &str) -> Vec<u32> {
        self.occupied
            .get(guild)
            .map(|taken| taken.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of occupied slots for `guild`.
    pub fn count(&self, guild: &str) -> usize {
        self.occupied.get(guild).map_or(0, BTreeSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_is_ascending_first_fit() {
        let mut slots = SlotTable::new(3);
        assert_eq!(slots.acquire("g"), Some(1));
        assert_eq!(slots.acquire("g"), Some(2));
        assert_eq!(slots.acquire("g"), Some(3));
        assert_eq!(slots.acquire("g"), None);
    }

    #[test]
    fn released_low_number_is_reused_first() {
        let mut slots = SlotTable::new(3);
        slots.acquire("g");
        slots.acquire("g");
        slots.acquire("g");

        assert!(slots.release("g", 2));
        assert_eq!(slots.acquire("g"), Some(2));
        assert_eq!(slots.occupied("g"), vec![1, 2, 3]);
    }

    #[test]
    fn guilds_are_independent() {
        let mut slots = SlotTable::new(1);
        assert_eq!(slots.acquire("a"), Some(1));
        assert_eq!(slots.acquire("b"), Some(1));
        assert_eq!(slots.acquire("a"), None);
        assert_eq!(slots.count("a"), 1);
        assert_eq!(slots.count("b"), 1);
    }

    #[test]
    fn acquire_then_release_restores_prior_state() {
        let mut slots = SlotTable::new(4);
        slots.acquire("g");
        slots.acquire("g");
        let before = slots.occupied("g");

        let n = slots.acquire("g").unwrap();
        assert!(slots.release("g", n));

        assert_eq!(slots.occupied("g"), before);
        assert_eq!(slots.acquire("g"), Some(n));
    }

    #[test]
    fn release_is_idempotent() {
        let mut slots = SlotTable::new(2);
        let n = slots.acquire("g").unwrap();

        assert!(slots.release("g", n));
        assert!(!slots.release("g", n));
        assert!(!slots.release("g", 2));
        assert!(!slots.release("unknown", 1));
        assert_eq!(slots.count("g"), 0);
    }

    #[test]
    fn numbers_stay_in_range() {
        let mut slots = SlotTable::new(5);
        while let Some(n) = slots.acquire("g") {
            assert!((1..=5).contains(&n));
        }
        assert_eq!(slots.occupied("g"), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn zero_capacity_never_allocates() {
        let mut slots = SlotTable::new(0);
        assert_eq!(slots.acquire("g"), None);
        assert_eq!(slots.count("g"), 0);
        assert!(!slots.is_occupied("g", 1));
    }
}
