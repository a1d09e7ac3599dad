use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::booking;
use crate::error::AppError;
use crate::matcher;
use crate::models::booking::VehicleType;
use crate::models::location::Location;
use crate::models::passenger::Passenger;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/passenger/register", post(register))
        .route("/passenger/update", put(update_profile))
        .route("/passenger/location/update", post(update_location))
        .route("/passenger/nearby-taxis", post(nearby_taxis))
        .route("/passenger/book", post(book))
        .route("/passenger/confirm", post(confirm))
        .route("/passenger/cancel", post(cancel))
        .route("/passenger/booking/:booking_id", get(get_booking))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone_number: String,
    pub name: String,
    pub vehicle_preference: Option<VehicleType>,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub user_id: String,
    pub phone_number: Option<String>,
    pub name: Option<String>,
    pub vehicle_preference: Option<VehicleType>,
}

#[derive(Deserialize)]
pub struct LocationUpdateRequest {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
pub struct NearbyTaxisRequest {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub dropoff_latitude: Option<f64>,
    pub dropoff_longitude: Option<f64>,
    pub vehicle_preference: Option<VehicleType>,
}

#[derive(Deserialize)]
pub struct BookTaxiRequest {
    pub user_id: String,
    pub driver_id: String,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub dropoff_latitude: Option<f64>,
    pub dropoff_longitude: Option<f64>,
    pub vehicle_preference: Option<VehicleType>,
}

#[derive(Deserialize)]
pub struct BookingActionRequest {
    pub user_id: String,
    pub booking_id: Uuid,
}

fn optional_dropoff(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<Location>, AppError> {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => Ok(Some(Location::new(lat, lng)?)),
        (None, None) => Ok(None),
        _ => Err(AppError::BadRequest(
            "dropoff requires both latitude and longitude".to_string(),
        )),
    }
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    if payload.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id cannot be empty".to_string()));
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    let location = Location::new(payload.latitude, payload.longitude)?;
    let passenger = Passenger::new(
        payload.user_id.clone(),
        payload.name,
        payload.phone_number,
        payload.vehicle_preference,
        Some(location),
    );
    state.registry.put_passenger(passenger);

    Ok(Json(json!({
        "success": true,
        "message": "passenger registered",
        "user_id": payload.user_id,
    })))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .registry
        .with_passenger_mut(&payload.user_id, |passenger| {
            if let Some(name) = payload.name {
                passenger.name = name;
            }
            if let Some(phone_number) = payload.phone_number {
                passenger.phone_number = phone_number;
            }
            if let Some(preference) = payload.vehicle_preference {
                passenger.vehicle_preference = Some(preference);
            }
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "passenger updated",
    })))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LocationUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    let location = Location::new(payload.latitude, payload.longitude)?;
    state
        .registry
        .with_passenger_mut(&payload.user_id, |passenger| {
            passenger.current_location = Some(location);
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "location updated",
    })))
}

async fn nearby_taxis(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NearbyTaxisRequest>,
) -> Result<Json<Value>, AppError> {
    state.registry.passenger(&payload.user_id)?;

    let pickup = Location::new(payload.latitude, payload.longitude)?;
    let destination = optional_dropoff(payload.dropoff_latitude, payload.dropoff_longitude)?;

    let quotes = matcher::nearby_drivers(
        &state,
        &pickup,
        destination.as_ref(),
        payload.vehicle_preference,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "count": quotes.len(),
        "drivers": quotes,
    })))
}

async fn book(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookTaxiRequest>,
) -> Result<Json<Value>, AppError> {
    let pickup = Location::new(payload.pickup_latitude, payload.pickup_longitude)?;
    let dropoff = optional_dropoff(payload.dropoff_latitude, payload.dropoff_longitude)?;

    let booking = booking::create(
        &state,
        &payload.user_id,
        &payload.driver_id,
        pickup,
        dropoff,
        payload.vehicle_preference,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "booking created",
        "booking_id": booking.booking_id,
        "booking": booking,
    })))
}

async fn confirm(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookingActionRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = booking::passenger_confirm(&state, &payload.user_id, payload.booking_id)?;
    let driver = state.registry.driver(&booking.driver_id)?;

    Ok(Json(json!({
        "success": true,
        "message": "booking confirmed; ride can now be started",
        "booking_id": booking.booking_id,
        "status": booking.status,
        "fare": booking.fare,
        "driver": {
            "name": driver.name,
            "phone_number": driver.phone_number,
            "vehicle_type": driver.vehicle_type,
        },
    })))
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookingActionRequest>,
) -> Result<Json<Value>, AppError> {
    let (booking, fee) = booking::passenger_cancel(&state, &payload.user_id, payload.booking_id)?;

    Ok(Json(json!({
        "success": true,
        "message": "booking cancelled",
        "booking_id": booking.booking_id,
        "status": booking.status,
        "cancellation_fee": fee.total,
        "cancellation_fee_before_gst": fee.before_gst,
        "gst_amount": fee.gst_amount,
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
