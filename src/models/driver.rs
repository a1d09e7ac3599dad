use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::VehicleType;
use crate::models::location::Location;

/// A driver holds at most one non-terminal booking; `is_available` is
/// false whenever `active_booking_id` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub driver_id: String,
    pub name: String,
    pub phone_number: String,
    pub vehicle_type: VehicleType,
    pub vehicle_number: Option<String>,
    pub is_available: bool,
    pub current_location: Option<Location>,
    pub active_booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn new(
        driver_id: String,
        name: String,
        phone_number: String,
        vehicle_type: VehicleType,
        vehicle_number: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            driver_id,
            name,
            phone_number,
            vehicle_type,
            vehicle_number,
            is_available: false,
            current_location: None,
            active_booking_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}
