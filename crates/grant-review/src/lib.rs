pub mod config;
pub mod dashboard;
pub mod error;
pub mod review;
pub mod telemetry;
