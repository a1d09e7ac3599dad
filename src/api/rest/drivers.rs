use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::booking;
use crate::error::AppError;
use crate::models::booking::{BookingStatus, VehicleType};
use crate::models::driver::Driver;
use crate::models::location::Location;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/driver/register", post(register))
        .route("/driver/setavailability", post(set_availability))
        .route("/driver/updatelocation", post(update_location))
        .route("/driver/status/:driver_id", get(status))
        .route("/driver/accept", post(accept))
        .route("/driver/start", post(start))
        .route("/driver/complete", post(complete))
        .route("/driver/cancel", post(cancel))
        .route("/driver/booking/:booking_id", get(get_booking))
        .route("/driver/bookings/:driver_id", get(list_bookings))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub driver_id: String,
    pub name: String,
    pub phone_number: String,
    pub vehicle_type: VehicleType,
    pub vehicle_number: Option<String>,
}

#[derive(Deserialize)]
pub struct SetAvailabilityRequest {
    pub driver_id: String,
    pub is_available: bool,
}

#[derive(Deserialize)]
pub struct LocationUpdateRequest {
    pub driver_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
pub struct BookingActionRequest {
    pub driver_id: String,
    pub booking_id: Uuid,
}

#[derive(Deserialize)]
pub struct CompleteRideRequest {
    pub driver_id: String,
    pub booking_id: Uuid,
    pub dropoff_latitude: Option<f64>,
    pub dropoff_longitude: Option<f64>,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    if payload.driver_id.trim().is_empty() {
        return Err(AppError::BadRequest("driver_id cannot be empty".to_string()));
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    let driver = Driver::new(
        payload.driver_id.clone(),
        payload.name,
        payload.phone_number,
        payload.vehicle_type,
        payload.vehicle_number,
    );
    state.registry.put_driver(driver);

    Ok(Json(json!({
        "success": true,
        "message": "driver registered",
        "driver_id": payload.driver_id,
    })))
}

async fn set_availability(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SetAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .registry
        .with_driver_mut(&payload.driver_id, |driver| {
            if payload.is_available {
                if let Some(active) = driver.active_booking_id {
                    return Err(AppError::DriverUnavailable(format!(
                        "driver {} still holds booking {active}",
                        payload.driver_id
                    )));
                }
            }
            driver.is_available = payload.is_available;
            Ok(())
        })?;
    state.cache.invalidate_available_drivers().await;

    Ok(Json(json!({
        "success": true,
        "message": if payload.is_available { "driver online" } else { "driver offline" },
        "is_available": payload.is_available,
    })))
}

/// Driver clients call this every 3-5 seconds; the location is written
/// through to the cache so the matcher sees fresh positions.
async fn update_location(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LocationUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    let location = Location::new(payload.latitude, payload.longitude)?;
    state
        .registry
        .with_driver_mut(&payload.driver_id, |driver| {
            driver.current_location = Some(location);
            Ok(())
        })?;
    state
        .cache
        .set_driver_location(&payload.driver_id, location)
        .await;

    Ok(Json(json!({
        "success": true,
        "message": "location updated",
    })))
}

async fn status(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let driver = state.registry.driver(&driver_id)?;
    let active_bookings: Vec<_> = state
        .registry
        .bookings_for_driver(&driver_id)
        .into_iter()
        .filter(|booking| !booking.status.is_terminal())
        .collect();

    let booking_count = active_bookings.len();
    Ok(Json(json!({
        "success": true,
        "driver": driver,
        "active_bookings": active_bookings,
        "booking_count": booking_count,
    })))
}

async fn accept(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookingActionRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = booking::driver_accept(&state, &payload.driver_id, payload.booking_id)?;
    let passenger = state.registry.passenger(&booking.passenger_id)?;

    Ok(Json(json!({
        "success": true,
        "message": "booking accepted; waiting for passenger confirmation",
        "booking_id": booking.booking_id,
        "status": booking.status,
        "passenger": {
            "name": passenger.name,
            "phone_number": passenger.phone_number,
        },
        "pickup_location": booking.pickup_location,
        "fare": booking.fare,
        "estimated_time_minutes": booking.estimated_time_minutes,
    })))
}

async fn start(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookingActionRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = booking::driver_start(&state, &payload.driver_id, payload.booking_id)?;

    Ok(Json(json!({
        "success": true,
        "message": "ride started",
        "booking_id": booking.booking_id,
        "status": booking.status,
    })))
}

async fn complete(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CompleteRideRequest>,
) -> Result<Json<Value>, AppError> {
    let actual_dropoff = match (payload.dropoff_latitude, payload.dropoff_longitude) {
        (Some(lat), Some(lng)) => Some(Location::new(lat, lng)?),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "dropoff requires both latitude and longitude".to_string(),
            ));
        }
    };

    let booking = booking::driver_complete(
        &state,
        &payload.driver_id,
        payload.booking_id,
        actual_dropoff,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "ride completed",
        "booking_id": booking.booking_id,
        "status": booking.status,
        "final_fare": booking.fare,
    })))
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookingActionRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = booking::driver_cancel(&state, &payload.driver_id, payload.booking_id)?;

    Ok(Json(json!({
        "success": true,
        "message": "booking cancelled",
        "booking_id": booking.booking_id,
        "status": booking.status,
        "cancellation_fee": booking.cancellation_fee,
    })))
}

#[derive(Deserialize)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
}

/// Full booking history for a driver, newest first, optionally narrowed
/// to one status. An unknown driver simply has no bookings.
async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Value>, AppError> {
    let mut bookings = state.registry.bookings_for_driver(&driver_id);
    if let Some(status) = query.status {
        bookings.retain(|booking| booking.status == status);
    }
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let count = bookings.len();
    Ok(Json(json!({
        "success": true,
        "bookings": bookings,
        "count": count,
    })))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking = state.registry.booking(booking_id)?;
    Ok(Json(json!({
        "success": true,
        "booking": booking,
    })))
}
