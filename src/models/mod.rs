pub mod booking;
pub mod driver;
pub mod location;
pub mod passenger;
