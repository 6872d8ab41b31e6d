//! Keyed query cache with stale-time semantics.
//!
//! An entry is fresh while it is younger than the stale time and has not
//! been invalidated. Stale entries are still returned by [`QueryCache::get`]
//! so callers can keep showing them while a refetch runs.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Cache key of a query
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey(&'static str);

impl QueryKey {
    /// Create a query key
    #[must_use]
    pub const fn new(key: &'static str) -> Self {
        Self(key)
    }

    /// The key as a string slice
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Key of the ticket tier list
pub const TICKETS_QUERY_KEY: QueryKey = QueryKey::new("tickets");

struct CacheEntry<V> {
    value: V,
    updated_at: DateTime<Utc>,
    invalidated: bool,
}

/// Query results keyed by [`QueryKey`]
pub struct QueryCache<V> {
    entries: Mutex<HashMap<QueryKey, CacheEntry<V>>>,
    stale_time: Duration,
}

impl<V: Clone> QueryCache<V> {
    /// Create a cache whose entries go stale after `stale_time`
    ///
    /// A zero stale time makes every entry stale as soon as it is written.
    #[must_use]
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            stale_time,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The configured stale time
    #[must_use]
    pub const fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// The cached value, fresh or stale
    #[must_use]
    pub fn get(&self, key: QueryKey) -> Option<V> {
        self.lock().get(&key).map(|entry| entry.value.clone())
    }

    /// The cached value if it is still fresh at `now`
    #[must_use]
    pub fn get_fresh(&self, key: QueryKey, now: DateTime<Utc>) -> Option<V> {
        let entries = self.lock();
        let entry = entries.get(&key)?;

        if entry.invalidated {
            return None;
        }

        let age = (now - entry.updated_at).to_std().unwrap_or(Duration::ZERO);
        (age < self.stale_time).then(|| entry.value.clone())
    }

    /// Store `value` under `key`, fetched at `now`
    pub fn set(&self, key: QueryKey, value: V, now: DateTime<Utc>) {
        self.lock().insert(
            key,
            CacheEntry {
                value,
                updated_at: now,
                invalidated: false,
            },
        );
    }

    /// Mark the entry stale so the next read goes to the network
    ///
    /// Returns true if an entry existed.
    pub fn invalidate(&self, key: QueryKey) -> bool {
        match self.lock().get_mut(&key) {
            Some(entry) => {
                entry.invalidated = true;
                tracing::debug!(%key, "Invalidated query");
                true
            },
            None => false,
        }
    }
}

impl<V> fmt::Debug for QueryCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("stale_time", &self.stale_time)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticket_booking_testing::test_clock;
    use ticket_booking_core::Clock;

    #[test]
    fn test_zero_stale_time_is_always_stale() {
        let cache = QueryCache::new(Duration::ZERO);
        let now = test_clock().now();

        cache.set(TICKETS_QUERY_KEY, vec![1, 2, 3], now);

        assert_eq!(cache.get_fresh(TICKETS_QUERY_KEY, now), None);
        assert_eq!(cache.get(TICKETS_QUERY_KEY), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_entry_fresh_until_stale_time() {
        let cache = QueryCache::new(Duration::from_secs(30));
        let now = test_clock().now();

        cache.set(TICKETS_QUERY_KEY, "tiers", now);

        assert_eq!(
            cache.get_fresh(TICKETS_QUERY_KEY, now + chrono::Duration::seconds(29)),
            Some("tiers")
        );
        assert_eq!(
            cache.get_fresh(TICKETS_QUERY_KEY, now + chrono::Duration::seconds(30)),
            None
        );
    }

    #[test]
    fn test_invalidate_marks_stale_but_keeps_value() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let now = test_clock().now();

        assert!(!cache.invalidate(TICKETS_QUERY_KEY));

        cache.set(TICKETS_QUERY_KEY, 7, now);
        assert!(cache.invalidate(TICKETS_QUERY_KEY));

        assert_eq!(cache.get_fresh(TICKETS_QUERY_KEY, now), None);
        assert_eq!(cache.get(TICKETS_QUERY_KEY), Some(7));

        // Writing again makes it fresh
        cache.set(TICKETS_QUERY_KEY, 8, now);
        assert_eq!(cache.get_fresh(TICKETS_QUERY_KEY, now), Some(8));
    }
}
