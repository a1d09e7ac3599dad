use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::AppError;
use crate::geo;
use crate::models::location::Location;

#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub distance_km: f64,
    pub duration_min: f64,
}

/// Road-distance/ETA provider. External implementations may call out to
/// a maps API; the haversine implementation is the mandatory default.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(&self, origin: &Location, destination: &Location) -> Result<Route, AppError>;

    fn name(&self) -> &'static str;
}

/// Great-circle estimate, always available.
pub struct HaversineRoute;

#[async_trait]
impl RouteProvider for HaversineRoute {
    async fn route(&self, origin: &Location, destination: &Location) -> Result<Route, AppError> {
        let distance_km = geo::haversine_km(origin, destination)?;
        Ok(Route {
            distance_km,
            duration_min: geo::estimate_minutes(distance_km),
        })
    }

    fn name(&self) -> &'static str {
        "haversine"
    }
}

#[derive(Debug)]
pub struct ResolvedRoute {
    pub route: Route,
    pub fell_back: bool,
}

/// Resolves a route through the configured provider with a hard timeout.
/// A failed or slow provider is substituted once with the haversine
/// estimate; coordinate validation errors are not recoverable and
/// propagate as-is.
pub async fn resolve(
    provider: &dyn RouteProvider,
    timeout: Duration,
    origin: &Location,
    destination: &Location,
) -> Result<ResolvedRoute, AppError> {
    origin.validate()?;
    destination.validate()?;

    match tokio::time::timeout(timeout, provider.route(origin, destination)).await {
        Ok(Ok(route)) => Ok(ResolvedRoute {
            route,
            fell_back: false,
        }),
        Ok(Err(err @ AppError::InvalidCoordinate { .. })) => Err(err),
        Ok(Err(err)) => {
            warn!(provider = provider.name(), error = %err, "route provider failed; using haversine estimate");
            fallback(origin, destination).await
        }
        Err(_elapsed) => {
            warn!(provider = provider.name(), "route provider timed out; using haversine estimate");
            fallback(origin, destination).await
        }
    }
}

async fn fallback(origin: &Location, destination: &Location) -> Result<ResolvedRoute, AppError> {
    let route = HaversineRoute.route(origin, destination).await?;
    Ok(ResolvedRoute {
        route,
        fell_back: true,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{HaversineRoute, Route, RouteProvider, resolve};
    use crate::error::AppError;
    use crate::models::location::Location;
    use async_trait::async_trait;

    struct FailingProvider;

    #[async_trait]
    impl RouteProvider for FailingProvider {
        async fn route(&self, _: &Location, _: &Location) -> Result<Route, AppError> {
            Err(AppError::ProviderUnavailable("maps down".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct StalledProvider;

    #[async_trait]
    impl RouteProvider for StalledProvider {
        async fn route(&self, _: &Location, _: &Location) -> Result<Route, AppError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            unreachable!("sleep outlives the test timeout")
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    fn delhi() -> Location {
        Location {
            latitude: 28.6139,
            longitude: 77.2090,
        }
    }

    fn gurgaon() -> Location {
        Location {
            latitude: 28.4595,
            longitude: 77.0266,
        }
    }

    #[tokio::test]
    async fn healthy_provider_is_used_directly() {
        let resolved = resolve(
            &HaversineRoute,
            Duration::from_millis(100),
            &delhi(),
            &gurgaon(),
        )
        .await
        .unwrap();

        assert!(!resolved.fell_back);
        assert!(resolved.route.distance_km > 0.0);
        assert!(resolved.route.duration_min > 0.0);
    }

    #[tokio::test]
    async fn failing_provider_falls_back_to_haversine() {
        let resolved = resolve(
            &FailingProvider,
            Duration::from_millis(100),
            &delhi(),
            &gurgaon(),
        )
        .await
        .unwrap();

        assert!(resolved.fell_back);
        assert!(resolved.route.distance_km > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out_and_falls_back() {
        let resolved = resolve(
            &StalledProvider,
            Duration::from_millis(50),
            &delhi(),
            &gurgaon(),
        )
        .await
        .unwrap();

        assert!(resolved.fell_back);
    }

    #[tokio::test]
    async fn invalid_coordinates_are_not_recovered() {
        let bad = Location {
            latitude: 95.0,
            longitude: 0.0,
        };
        let err = resolve(&FailingProvider, Duration::from_millis(100), &bad, &delhi())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCoordinate { .. }));
    }
}
