use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::models::location::Location;

/// Short-TTL cache for driver locations and the available-driver list.
/// Purely an acceleration layer: a miss or an absent cache changes
/// latency, never results.
#[async_trait]
pub trait LocationCache: Send + Sync {
    async fn driver_location(&self, driver_id: &str) -> Option<Location>;

    async fn set_driver_location(&self, driver_id: &str, location: Location);

    async fn invalidate_driver(&self, driver_id: &str);

    async fn available_drivers(&self) -> Option<Vec<String>>;

    async fn set_available_drivers(&self, driver_ids: Vec<String>);

    async fn invalidate_available_drivers(&self);
}

/// Default when no cache adapter is wired in; every lookup misses.
pub struct NoopCache;

#[async_trait]
impl LocationCache for NoopCache {
    async fn driver_location(&self, _driver_id: &str) -> Option<Location> {
        None
    }

    async fn set_driver_location(&self, _driver_id: &str, _location: Location) {}

    async fn invalidate_driver(&self, _driver_id: &str) {}

    async fn available_drivers(&self) -> Option<Vec<String>> {
        None
    }

    async fn set_available_drivers(&self, _driver_ids: Vec<String>) {}

    async fn invalidate_available_drivers(&self) {}
}

/// Process-local TTL cache; stands in for the Redis-like adapter.
pub struct MemoryCache {
    driver_locations: DashMap<String, (Location, Instant)>,
    available: RwLock<Option<(Vec<String>, Instant)>>,
    location_ttl: Duration,
    list_ttl: Duration,
}

impl MemoryCache {
    pub fn new(location_ttl: Duration, list_ttl: Duration) -> Self {
        Self {
            driver_locations: DashMap::new(),
            available: RwLock::new(None),
            location_ttl,
            list_ttl,
        }
    }
}

#[async_trait]
impl LocationCache for MemoryCache {
    async fn driver_location(&self, driver_id: &str) -> Option<Location> {
        let entry = self.driver_locations.get(driver_id)?;
        let (location, expires_at) = entry.value();
        if Instant::now() < *expires_at {
            Some(*location)
        } else {
            None
        }
    }

    async fn set_driver_location(&self, driver_id: &str, location: Location) {
        self.driver_locations.insert(
            driver_id.to_string(),
            (location, Instant::now() + self.location_ttl),
        );
    }

    async fn invalidate_driver(&self, driver_id: &str) {
        self.driver_locations.remove(driver_id);
    }

    async fn available_drivers(&self) -> Option<Vec<String>> {
        let guard = self.available.read().ok()?;
        let (driver_ids, expires_at) = guard.as_ref()?;
        if Instant::now() < *expires_at {
            Some(driver_ids.clone())
        } else {
            None
        }
    }

    async fn set_available_drivers(&self, driver_ids: Vec<String>) {
        if let Ok(mut guard) = self.available.write() {
            *guard = Some((driver_ids, Instant::now() + self.list_ttl));
        }
    }

    async fn invalidate_available_drivers(&self) {
        if let Ok(mut guard) = self.available.write() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{LocationCache, MemoryCache, NoopCache};
    use crate::models::location::Location;

    fn point() -> Location {
        Location {
            latitude: 28.6139,
            longitude: 77.2090,
        }
    }

    #[tokio::test]
    async fn noop_cache_always_misses() {
        let cache = NoopCache;
        cache.set_driver_location("driver_001", point()).await;
        assert!(cache.driver_location("driver_001").await.is_none());

        cache.set_available_drivers(vec!["driver_001".into()]).await;
        assert!(cache.available_drivers().await.is_none());
    }

    #[tokio::test]
    async fn memory_cache_round_trips_within_ttl() {
        let cache = MemoryCache::new(Duration::from_secs(10), Duration::from_secs(5));
        cache.set_driver_location("driver_001", point()).await;

        let cached = cache.driver_location("driver_001").await.unwrap();
        assert_eq!(cached, point());

        cache.invalidate_driver("driver_001").await;
        assert!(cache.driver_location("driver_001").await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let cache = MemoryCache::new(Duration::ZERO, Duration::ZERO);
        cache.set_driver_location("driver_001", point()).await;
        cache.set_available_drivers(vec!["driver_001".into()]).await;

        assert!(cache.driver_location("driver_001").await.is_none());
        assert!(cache.available_drivers().await.is_none());
    }

    #[tokio::test]
    async fn available_list_can_be_invalidated() {
        let cache = MemoryCache::new(Duration::from_secs(10), Duration::from_secs(10));
        cache.set_available_drivers(vec!["driver_001".into()]).await;
        assert!(cache.available_drivers().await.is_some());

        cache.invalidate_available_drivers().await;
        assert!(cache.available_drivers().await.is_none());
    }
}
