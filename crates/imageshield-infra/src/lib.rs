//! ImageShield Infrastructure Library
//!
//! Shared infrastructure used by the CLI:
//! - Telemetry initialization (tracing subscriber)
//! - Activity log storage

pub mod activity_log;
pub mod telemetry;

// Re-export commonly used types
pub use activity_log::ActivityLog;
pub use telemetry::init_tracing;
