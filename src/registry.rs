use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::driver::Driver;
use crate::models::passenger::Passenger;

/// In-memory entity stores. Every read-modify-write goes through a
/// per-entry `get_mut` guard, so each driver and each booking is a unit
/// of mutual exclusion; callers must not hold a guard across an await.
#[derive(Default)]
pub struct Registry {
    drivers: DashMap<String, Driver>,
    passengers: DashMap<String, Passenger>,
    bookings: DashMap<Uuid, Booking>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_passenger(&self, passenger: Passenger) {
        self.passengers
            .insert(passenger.user_id.clone(), passenger);
    }

    pub fn passenger(&self, user_id: &str) -> Result<Passenger, AppError> {
        self.passengers
            .get(user_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("passenger {user_id} not found")))
    }

    pub fn with_passenger_mut<T>(
        &self,
        user_id: &str,
        apply: impl FnOnce(&mut Passenger) -> T,
    ) -> Result<T, AppError> {
        let mut entry = self
            .passengers
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("passenger {user_id} not found")))?;
        let passenger = entry.value_mut();
        let result = apply(passenger);
        passenger.updated_at = Utc::now();
        Ok(result)
    }

    pub fn put_driver(&self, driver: Driver) {
        self.drivers.insert(driver.driver_id.clone(), driver);
    }

    pub fn driver(&self, driver_id: &str) -> Result<Driver, AppError> {
        self.drivers
            .get(driver_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))
    }

    pub fn with_driver_mut<T>(
        &self,
        driver_id: &str,
        apply: impl FnOnce(&mut Driver) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut entry = self
            .drivers
            .get_mut(driver_id)
            .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;
        let driver = entry.value_mut();
        let result = apply(driver)?;
        driver.updated_at = Utc::now();
        Ok(result)
    }

    /// Atomically flips an available driver to reserved. Fails without
    /// side effects when the driver is offline or already holds a
    /// booking, so two racing requests cannot both take the driver.
    pub fn reserve_driver(&self, driver_id: &str, booking_id: Uuid) -> Result<Driver, AppError> {
        self.with_driver_mut(driver_id, |driver| {
            if !driver.is_available || driver.active_booking_id.is_some() {
                return Err(AppError::DriverUnavailable(format!(
                    "driver {driver_id} is not available"
                )));
            }
            driver.is_available = false;
            driver.active_booking_id = Some(booking_id);
            Ok(driver.clone())
        })
    }

    /// Clears the reservation only if it still points at the given
    /// booking; a stale release never clobbers a newer reservation.
    pub fn release_driver(&self, driver_id: &str, booking_id: Uuid) {
        if let Some(mut entry) = self.drivers.get_mut(driver_id) {
            let driver = entry.value_mut();
            if driver.active_booking_id == Some(booking_id) {
                driver.is_available = true;
                driver.active_booking_id = None;
                driver.updated_at = Utc::now();
            }
        }
    }

    pub fn insert_booking(&self, booking: Booking) {
        self.bookings.insert(booking.booking_id, booking);
    }

    pub fn booking(&self, booking_id: Uuid) -> Result<Booking, AppError> {
        self.bookings
            .get(&booking_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))
    }

    /// Compare-and-set status transition. The current status must be one
    /// of `expected` or the call fails with `InvalidTransition` and no
    /// mutation; exactly one of any set of racing callers wins.
    pub fn transition_booking(
        &self,
        booking_id: Uuid,
        expected: &[BookingStatus],
        next: BookingStatus,
        apply: impl FnOnce(&mut Booking),
    ) -> Result<Booking, AppError> {
        let mut entry = self
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
        let booking = entry.value_mut();

        if !expected.contains(&booking.status) {
            return Err(AppError::InvalidTransition {
                from: booking.status,
                to: next,
            });
        }

        booking.status = next;
        apply(booking);
        Ok(booking.clone())
    }

    /// Drivers eligible for matching: online and not reserved by a live
    /// booking.
    pub fn available_drivers(&self) -> Vec<Driver> {
        self.drivers
            .iter()
            .filter(|entry| {
                let driver = entry.value();
                driver.is_available && driver.active_booking_id.is_none()
            })
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn available_driver_count(&self) -> usize {
        self.drivers
            .iter()
            .filter(|entry| {
                let driver = entry.value();
                driver.is_available && driver.active_booking_id.is_none()
            })
            .count()
    }

    /// Count of bookings still moving through the lifecycle; drives the
    /// demand side of the surge ratio.
    pub fn active_booking_count(&self) -> usize {
        self.bookings
            .iter()
            .filter(|entry| !entry.value().status.is_terminal())
            .count()
    }

    pub fn bookings_for_driver(&self, driver_id: &str) -> Vec<Booking> {
        self.bookings
            .iter()
            .filter(|entry| entry.value().driver_id == driver_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    pub fn passenger_count(&self) -> usize {
        self.passengers.len()
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }
}
