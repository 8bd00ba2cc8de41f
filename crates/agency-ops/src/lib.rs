pub mod agency;
pub mod config;
pub mod error;
pub mod telemetry;
