use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::error::AppError;
use crate::geo;
use crate::models::booking::VehicleType;
use crate::models::driver::Driver;
use crate::models::location::Location;
use crate::pricing;
use crate::state::AppState;

/// A ranked candidate for a pickup request.
#[derive(Debug, Clone, Serialize)]
pub struct DriverQuote {
    pub driver_id: String,
    pub driver_name: String,
    pub driver_phone: String,
    pub vehicle_type: VehicleType,
    pub location: Location,
    pub distance_km: f64,
    pub eta_minutes: f64,
    pub surge_multiplier: f64,
    pub estimated_fare: Option<f64>,
}

/// Ranks available drivers by haversine distance to the pickup point,
/// closest first, ties broken by driver id. When a destination is given,
/// the ride leg is resolved once and an estimated fare is attached to
/// every candidate. An empty list is the "no drivers" outcome, not an
/// error.
pub async fn nearby_drivers(
    state: &AppState,
    pickup: &Location,
    destination: Option<&Location>,
    vehicle_preference: Option<VehicleType>,
) -> Result<Vec<DriverQuote>, AppError> {
    pickup.validate()?;
    if let Some(dropoff) = destination {
        dropoff.validate()?;
    }

    let start = Instant::now();
    let available_count = state.registry.available_driver_count();
    let demand_count = state.registry.active_booking_count() + 1;
    let surge = pricing::surge_multiplier(demand_count, available_count);

    let ride_leg = match destination {
        Some(dropoff) => Some(state.route(pickup, dropoff).await?),
        None => None,
    };
    let estimated_fare = ride_leg
        .map(|leg| pricing::fare(&state.config.pricing, leg.distance_km, leg.duration_min, surge));

    let mut quotes = Vec::new();
    for driver in candidate_drivers(state).await {
        if let Some(preferred) = vehicle_preference {
            if driver.vehicle_type != preferred {
                continue;
            }
        }

        let Some(location) = driver_location(state, &driver).await else {
            continue;
        };

        let distance_km = geo::haversine_km(&location, pickup)?;
        quotes.push(DriverQuote {
            driver_id: driver.driver_id,
            driver_name: driver.name,
            driver_phone: driver.phone_number,
            vehicle_type: driver.vehicle_type,
            location,
            distance_km,
            eta_minutes: geo::estimate_minutes(distance_km),
            surge_multiplier: surge,
            estimated_fare,
        });
    }

    quotes.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.driver_id.cmp(&b.driver_id))
    });

    let outcome = if quotes.is_empty() { "empty" } else { "matched" };
    state
        .metrics
        .match_latency_seconds
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());

    debug!(
        candidates = quotes.len(),
        surge,
        demand = demand_count,
        available = available_count,
        "ranked nearby drivers"
    );

    Ok(quotes)
}

/// Candidate set, preferring the cached available-driver list. Cached
/// ids are re-checked against the registry so a driver reserved since
/// the list was cached never reappears.
async fn candidate_drivers(state: &AppState) -> Vec<Driver> {
    if let Some(cached_ids) = state.cache.available_drivers().await {
        let drivers: Vec<Driver> = cached_ids
            .iter()
            .filter_map(|id| state.registry.driver(id).ok())
            .filter(|driver| driver.is_available && driver.active_booking_id.is_none())
            .collect();
        if !drivers.is_empty() {
            return drivers;
        }
    }

    let drivers = state.registry.available_drivers();
    let ids = drivers
        .iter()
        .map(|driver| driver.driver_id.clone())
        .collect();
    state.cache.set_available_drivers(ids).await;
    drivers
}

async fn driver_location(state: &AppState, driver: &Driver) -> Option<Location> {
    match state.cache.driver_location(&driver.driver_id).await {
        Some(location) => Some(location),
        None => driver.current_location,
    }
}
