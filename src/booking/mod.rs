use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::{Booking, BookingStatus, CancelledBy, VehicleType};
use crate::models::location::Location;
use crate::pricing::{self, CancellationFee};
use crate::state::AppState;

/// States a booking can still be cancelled from; once the ride is in
/// progress cancellation is no longer legal.
const CANCELLABLE: &[BookingStatus] = &[
    BookingStatus::Pending,
    BookingStatus::DriverAccepted,
    BookingStatus::Confirmed,
];

/// Creates a pending booking and reserves the driver in the same step,
/// so the driver can never hold two live offers. The quote is priced on
/// the ride leg when a destination is known, otherwise on the driver's
/// approach leg.
pub async fn create(
    state: &AppState,
    passenger_id: &str,
    driver_id: &str,
    pickup: Location,
    dropoff: Option<Location>,
    vehicle_preference: Option<VehicleType>,
) -> Result<Booking, AppError> {
    pickup.validate()?;
    if let Some(location) = &dropoff {
        location.validate()?;
    }

    let passenger = state.registry.passenger(passenger_id)?;
    let driver = state.registry.driver(driver_id)?;
    if !driver.is_available || driver.active_booking_id.is_some() {
        return Err(AppError::DriverUnavailable(format!(
            "driver {driver_id} is not available"
        )));
    }

    let driver_location = match state.cache.driver_location(driver_id).await {
        Some(location) => location,
        None => driver.current_location.ok_or_else(|| {
            AppError::DriverUnavailable(format!("driver {driver_id} has no known location"))
        })?,
    };

    let vehicle_type = vehicle_preference
        .or(passenger.vehicle_preference)
        .unwrap_or(driver.vehicle_type);

    let leg = match &dropoff {
        Some(destination) => state.route(&pickup, destination).await?,
        None => state.route(&driver_location, &pickup).await?,
    };

    let demand_count = state.registry.active_booking_count() + 1;
    let available_count = state.registry.available_driver_count();
    let surge = pricing::surge_multiplier(demand_count, available_count);
    let fare = pricing::fare(&state.config.pricing, leg.distance_km, leg.duration_min, surge);

    // Reservation is the commit point: it fails without side effects if
    // another request took the driver while the quote was being priced.
    let booking_id = Uuid::new_v4();
    state.registry.reserve_driver(driver_id, booking_id)?;

    let booking = Booking {
        booking_id,
        passenger_id: passenger_id.to_string(),
        driver_id: driver_id.to_string(),
        pickup_location: pickup,
        dropoff_location: dropoff,
        vehicle_type,
        status: BookingStatus::Pending,
        distance_km: leg.distance_km,
        estimated_time_minutes: leg.duration_min,
        surge_multiplier: surge,
        fare,
        passenger_confirmed: false,
        cancellation_fee: None,
        cancelled_by: None,
        created_at: Utc::now(),
        accepted_at: None,
        confirmed_at: None,
        started_at: None,
        completed_at: None,
        cancelled_at: None,
    };
    state.registry.insert_booking(booking.clone());
    state.cache.invalidate_available_drivers().await;

    state.metrics.bookings_total.with_label_values(&["created"]).inc();
    state.metrics.active_bookings.inc();
    info!(
        booking_id = %booking_id,
        passenger_id,
        driver_id,
        fare,
        surge,
        "booking created"
    );

    Ok(booking)
}

/// Only the driver reserved at creation may accept, and only while the
/// booking is still pending; a duplicate or raced accept loses the
/// compare-and-set and observes `InvalidTransition`.
pub fn driver_accept(
    state: &AppState,
    driver_id: &str,
    booking_id: Uuid,
) -> Result<Booking, AppError> {
    let booking = state.registry.booking(booking_id)?;
    if booking.driver_id != driver_id {
        return Err(AppError::NotAuthorized(format!(
            "booking {booking_id} is not assigned to driver {driver_id}"
        )));
    }

    let updated = state.registry.transition_booking(
        booking_id,
        &[BookingStatus::Pending],
        BookingStatus::DriverAccepted,
        |booking| {
            booking.accepted_at = Some(Utc::now());
        },
    )?;

    record_transition(state, &updated);
    Ok(updated)
}

/// Second half of the two-way handshake: the owning passenger confirms
/// after the driver has accepted.
pub fn passenger_confirm(
    state: &AppState,
    passenger_id: &str,
    booking_id: Uuid,
) -> Result<Booking, AppError> {
    let booking = state.registry.booking(booking_id)?;
    if booking.passenger_id != passenger_id {
        return Err(AppError::NotAuthorized(format!(
            "booking {booking_id} does not belong to passenger {passenger_id}"
        )));
    }

    let updated = state.registry.transition_booking(
        booking_id,
        &[BookingStatus::DriverAccepted],
        BookingStatus::Confirmed,
        |booking| {
            booking.passenger_confirmed = true;
            booking.confirmed_at = Some(Utc::now());
        },
    )?;

    record_transition(state, &updated);
    Ok(updated)
}

pub fn driver_start(
    state: &AppState,
    driver_id: &str,
    booking_id: Uuid,
) -> Result<Booking, AppError> {
    let booking = state.registry.booking(booking_id)?;
    if booking.driver_id != driver_id {
        return Err(AppError::NotAuthorized(format!(
            "booking {booking_id} is not assigned to driver {driver_id}"
        )));
    }

    let updated = state.registry.transition_booking(
        booking_id,
        &[BookingStatus::Confirmed],
        BookingStatus::InProgress,
        |booking| {
            booking.started_at = Some(Utc::now());
        },
    )?;

    record_transition(state, &updated);
    Ok(updated)
}

/// Completes the ride and releases the driver. When the actual dropoff
/// differs from the booked one, the ride is re-measured and re-priced at
/// the surge current now. Routing happens outside any registry guard;
/// the pre-state is checked again by the compare-and-set.
pub async fn driver_complete(
    state: &AppState,
    driver_id: &str,
    booking_id: Uuid,
    actual_dropoff: Option<Location>,
) -> Result<Booking, AppError> {
    if let Some(location) = &actual_dropoff {
        location.validate()?;
    }

    let booking = state.registry.booking(booking_id)?;
    if booking.driver_id != driver_id {
        return Err(AppError::NotAuthorized(format!(
            "booking {booking_id} is not assigned to driver {driver_id}"
        )));
    }
    if booking.status != BookingStatus::InProgress {
        return Err(AppError::InvalidTransition {
            from: booking.status,
            to: BookingStatus::Completed,
        });
    }

    let repriced = match actual_dropoff {
        Some(dropoff) if booking.dropoff_location != Some(dropoff) => {
            let ride = state.route(&booking.pickup_location, &dropoff).await?;
            let surge = pricing::surge_multiplier(
                state.registry.active_booking_count(),
                state.registry.available_driver_count(),
            );
            let fare =
                pricing::fare(&state.config.pricing, ride.distance_km, ride.duration_min, surge);
            Some((dropoff, ride, surge, fare))
        }
        _ => None,
    };

    let updated = state.registry.transition_booking(
        booking_id,
        &[BookingStatus::InProgress],
        BookingStatus::Completed,
        |booking| {
            booking.completed_at = Some(Utc::now());
            if let Some((dropoff, ride, surge, fare)) = repriced {
                booking.dropoff_location = Some(dropoff);
                booking.distance_km = ride.distance_km;
                booking.estimated_time_minutes = ride.duration_min;
                booking.surge_multiplier = surge;
                booking.fare = fare;
            } else if let Some(dropoff) = actual_dropoff {
                booking.dropoff_location = Some(dropoff);
            }
        },
    )?;

    state.registry.release_driver(driver_id, booking_id);
    state.cache.invalidate_available_drivers().await;

    record_transition(state, &updated);
    state
        .metrics
        .bookings_total
        .with_label_values(&["completed"])
        .inc();
    state.metrics.active_bookings.dec();
    info!(booking_id = %booking_id, driver_id, fare = updated.fare, "ride completed");

    Ok(updated)
}

/// Passenger-side cancellation; legal until the ride starts. The fee
/// decays with time since creation per the pricing rules.
pub fn passenger_cancel(
    state: &AppState,
    passenger_id: &str,
    booking_id: Uuid,
) -> Result<(Booking, CancellationFee), AppError> {
    let booking = state.registry.booking(booking_id)?;
    if booking.passenger_id != passenger_id {
        return Err(AppError::NotAuthorized(format!(
            "booking {booking_id} does not belong to passenger {passenger_id}"
        )));
    }

    let elapsed_minutes =
        (Utc::now() - booking.created_at).num_milliseconds() as f64 / 60_000.0;
    let fee = pricing::cancellation_fee(
        &state.config.pricing,
        booking.fare,
        booking.vehicle_type,
        elapsed_minutes,
    );

    let updated = state.registry.transition_booking(
        booking_id,
        CANCELLABLE,
        BookingStatus::Cancelled,
        |booking| {
            booking.cancelled_at = Some(Utc::now());
            booking.cancelled_by = Some(CancelledBy::Passenger);
            booking.cancellation_fee = Some(fee.total);
        },
    )?;

    finish_cancellation(state, &updated);
    Ok((updated, fee))
}

/// Driver-side cancellation; the passenger is not charged.
pub fn driver_cancel(
    state: &AppState,
    driver_id: &str,
    booking_id: Uuid,
) -> Result<Booking, AppError> {
    let booking = state.registry.booking(booking_id)?;
    if booking.driver_id != driver_id {
        return Err(AppError::NotAuthorized(format!(
            "booking {booking_id} is not assigned to driver {driver_id}"
        )));
    }

    let updated = state.registry.transition_booking(
        booking_id,
        CANCELLABLE,
        BookingStatus::Cancelled,
        |booking| {
            booking.cancelled_at = Some(Utc::now());
            booking.cancelled_by = Some(CancelledBy::Driver);
            booking.cancellation_fee = Some(0.0);
        },
    )?;

    finish_cancellation(state, &updated);
    Ok(updated)
}

fn finish_cancellation(state: &AppState, booking: &Booking) {
    state
        .registry
        .release_driver(&booking.driver_id, booking.booking_id);
    state
        .metrics
        .bookings_total
        .with_label_values(&["cancelled"])
        .inc();
    state.metrics.active_bookings.dec();
    record_transition(state, booking);
    info!(
        booking_id = %booking.booking_id,
        fee = booking.cancellation_fee.unwrap_or(0.0),
        "booking cancelled"
    );
}

fn record_transition(state: &AppState, booking: &Booking) {
    let to = booking.status.to_string();
    state
        .metrics
        .booking_transitions_total
        .with_label_values(&[to.as_str()])
        .inc();
}
