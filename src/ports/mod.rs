pub mod cache;
pub mod route;
