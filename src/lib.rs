pub mod api;
pub mod booking;
pub mod config;
pub mod error;
pub mod geo;
pub mod matcher;
pub mod models;
pub mod observability;
pub mod ports;
pub mod pricing;
pub mod registry;
pub mod state;
