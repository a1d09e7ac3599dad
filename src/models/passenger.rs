use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::booking::VehicleType;
use crate::models::location::Location;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub user_id: String,
    pub name: String,
    pub phone_number: String,
    pub vehicle_preference: Option<VehicleType>,
    pub current_location: Option<Location>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Passenger {
    pub fn new(
        user_id: String,
        name: String,
        phone_number: String,
        vehicle_preference: Option<VehicleType>,
        current_location: Option<Location>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            name,
            phone_number,
            vehicle_preference,
            current_location,
            created_at: now,
            updated_at: now,
        }
    }
}
