pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod scripts;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use error::{ApiError, Result};
