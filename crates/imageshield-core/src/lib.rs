//! ImageShield Core Library
//!
//! This crate provides the domain models, error types and configuration
//! shared by the processing components, the infrastructure layer and the CLI.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorMetadata, LogLevel, ShieldError};
pub use models::activity::{LogEntry, LogEntryParseError};
pub use models::session::{CleanScanRun, NoiseGuardRun, SafeShareRun, SessionState};
pub use models::tool::{FailurePolicy, ToolModule};
