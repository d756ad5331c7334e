pub mod config;
pub mod error;
pub mod import;
pub mod planner;
pub mod telemetry;
