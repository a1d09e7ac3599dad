use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Hatchback,
    Sedan,
    Suv,
    Premium,
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VehicleType::Hatchback => "hatchback",
            VehicleType::Sedan => "sedan",
            VehicleType::Suv => "suv",
            VehicleType::Premium => "premium",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    DriverAccepted,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::DriverAccepted => "driver_accepted",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelledBy {
    Passenger,
    Driver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: Uuid,
    pub passenger_id: String,
    pub driver_id: String,
    pub pickup_location: Location,
    pub dropoff_location: Option<Location>,
    pub vehicle_type: VehicleType,
    pub status: BookingStatus,
    pub distance_km: f64,
    pub estimated_time_minutes: f64,
    pub surge_multiplier: f64,
    pub fare: f64,
    pub passenger_confirmed: bool,
    pub cancellation_fee: Option<f64>,
    pub cancelled_by: Option<CancelledBy>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}
