//! Device cache: the lamp transport's only persistent state.
//!
//! Invariants enforced here:
//! - non-empty only after a successful scan
//! - a cached entry is fresh for [`CACHE_TTL`](crate::protocol_constants::CACHE_TTL)
//! - `last_scan_at` and the map are always read/written together, under one lock

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use super::types::{DeviceId, LampRecord};

#[derive(Default)]
struct CacheInner {
    lamps: HashMap<DeviceId, LampRecord>,
    last_scan_at: Option<Instant>,
}

/// Thread-safe cache of discovered lamps.
///
/// All reads and writes of the map and `last_scan_at` happen under the same
/// lock so a reader never observes one updated without the other.
pub struct DeviceCache {
    inner: RwLock<CacheInner>,
    ttl: Duration,
}

impl DeviceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            ttl,
        }
    }

    /// Returns `true` if the cache has been populated at least once and the
    /// last scan is still within the configured TTL.
    pub fn is_fresh(&self) -> bool {
        let inner = self.inner.read();
        match inner.last_scan_at {
            Some(t) => !inner.lamps.is_empty() && t.elapsed() < self.ttl,
            None => false,
        }
    }

    /// Returns a cloned snapshot of all cached lamps.
    pub fn snapshot(&self) -> Vec<LampRecord> {
        self.inner.read().lamps.values().cloned().collect()
    }

    /// Looks up a cached lamp's IP by device id, regardless of freshness.
    pub fn get_ip(&self, device_id: &str) -> Option<std::net::Ipv4Addr> {
        self.inner.read().lamps.get(device_id).map(|l| l.ip)
    }

    /// Atomically replaces the entire cache with a freshly scanned set and
    /// stamps `last_scan_at`. Called once per completed discovery, even if
    /// `lamps` is empty - an empty reply set is not an error.
    pub fn replace(&self, lamps: Vec<LampRecord>) {
        let mut inner = self.inner.write();
        inner.lamps = lamps.into_iter().map(|l| (l.device_id.clone(), l)).collect();
        inner.last_scan_at = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn lamp(id: &str, octet: u8) -> LampRecord {
        LampRecord {
            device_id: id.to_string(),
            ip: Ipv4Addr::new(192, 168, 1, octet),
            sku: "RGBW1".to_string(),
        }
    }

    #[test]
    fn empty_cache_is_not_fresh() {
        let cache = DeviceCache::new(Duration::from_secs(300));
        assert!(!cache.is_fresh());
        assert!(cache.snapshot().is_empty());
    }

    #[test]
    fn replace_populates_and_marks_fresh() {
        let cache = DeviceCache::new(Duration::from_secs(300));
        cache.replace(vec![lamp("a", 10), lamp("b", 11)]);
        assert!(cache.is_fresh());
        assert_eq!(cache.snapshot().len(), 2);
        assert_eq!(cache.get_ip("a"), Some(Ipv4Addr::new(192, 168, 1, 10)));
    }

    #[test]
    fn replace_with_empty_set_clears_cache_without_error() {
        let cache = DeviceCache::new(Duration::from_secs(300));
        cache.replace(vec![lamp("a", 10)]);
        cache.replace(vec![]);
        // A scan happened (last_scan_at is set) but the set is empty, so the
        // cache is populated-but-empty, which `is_fresh` treats as not fresh
        // per the "non-empty only after a successful scan" invariant.
        assert!(!cache.is_fresh());
        assert!(cache.snapshot().is_empty());
    }

    #[test]
    fn replace_evicts_entries_missing_from_new_scan() {
        let cache = DeviceCache::new(Duration::from_secs(300));
        cache.replace(vec![lamp("a", 10), lamp("b", 11)]);
        cache.replace(vec![lamp("a", 10)]);
        assert_eq!(cache.get_ip("b"), None);
        assert_eq!(cache.get_ip("a"), Some(Ipv4Addr::new(192, 168, 1, 10)));
    }
}
