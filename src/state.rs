use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::AppError;
use crate::models::location::Location;
use crate::observability::metrics::Metrics;
use crate::ports::cache::{LocationCache, MemoryCache};
use crate::ports::route::{HaversineRoute, Route, RouteProvider, resolve};
use crate::registry::Registry;

pub struct AppState {
    pub config: Config,
    pub registry: Registry,
    pub route_provider: Arc<dyn RouteProvider>,
    pub cache: Arc<dyn LocationCache>,
    pub metrics: Metrics,
}

impl AppState {
    /// Default adapters: haversine routing and a process-local cache.
    pub fn new(config: Config) -> Self {
        let cache = Arc::new(MemoryCache::new(
            Duration::from_secs(config.driver_location_ttl_secs),
            Duration::from_secs(config.available_drivers_ttl_secs),
        ));
        Self::with_adapters(config, Arc::new(HaversineRoute), cache)
    }

    pub fn with_adapters(
        config: Config,
        route_provider: Arc<dyn RouteProvider>,
        cache: Arc<dyn LocationCache>,
    ) -> Self {
        Self {
            config,
            registry: Registry::new(),
            route_provider,
            cache,
            metrics: Metrics::new(),
        }
    }

    /// Route lookup through the configured provider, falling back to the
    /// haversine estimate on failure or timeout.
    pub async fn route(&self, origin: &Location, destination: &Location) -> Result<Route, AppError> {
        let resolved = resolve(
            self.route_provider.as_ref(),
            self.config.route_timeout(),
            origin,
            destination,
        )
        .await?;

        if resolved.fell_back {
            self.metrics.route_fallbacks_total.inc();
        }

        Ok(resolved.route)
    }
}
