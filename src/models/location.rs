use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// GPS coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AppError> {
        let location = Self {
            latitude,
            longitude,
        };
        location.validate()?;
        Ok(location)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lng_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);

        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(AppError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}
