//! Error types module
//!
//! All failures surfaced by ImageShield are unified under [`ShieldError`].
//! Processing components keep their own narrower error enums and convert
//! into this one at the orchestrator boundary.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like invalid parameters
    Debug,
    /// Warning level - for recoverable issues like a missing detector model
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Describes how an error should be reported to the user and the log.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "INVALID_INPUT")
    fn error_code(&self) -> &'static str;

    /// Message shown to the user (may differ from the internal message)
    fn user_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum ShieldError {
    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Face detection error: {0}")]
    FaceDetection(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

}

impl ShieldError {
    /// Error message followed by its source chain, one cause per line.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for ShieldError {
    fn error_code(&self) -> &'static str {
        match self {
            ShieldError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            ShieldError::FaceDetection(_) => "FACE_DETECTION_ERROR",
            ShieldError::InvalidInput(_) => "INVALID_INPUT",
            ShieldError::Config(_) => "CONFIG_ERROR",
            ShieldError::Io(_) => "IO_ERROR",
            ShieldError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    fn user_message(&self) -> String {
        match self {
            ShieldError::ImageProcessing(msg) => msg.clone(),
            ShieldError::FaceDetection(msg) => format!("Face detection failed: {}", msg),
            ShieldError::InvalidInput(msg) => msg.clone(),
            ShieldError::Config(msg) => msg.clone(),
            ShieldError::Io(err) => format!("File access failed: {}", err),
            ShieldError::Serialization(_) => "Failed to read or write JSON data".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ShieldError::InvalidInput(_) | ShieldError::Config(_) => LogLevel::Debug,
            ShieldError::ImageProcessing(_) | ShieldError::FaceDetection(_) => LogLevel::Warn,
            ShieldError::Io(_) | ShieldError::Serialization(_) => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_invalid_input() {
        let err = ShieldError::InvalidInput("intensity must be positive".to_string());
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert_eq!(err.user_message(), "intensity must be positive");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_face_detection() {
        let err = ShieldError::FaceDetection("model missing".to_string());
        assert_eq!(err.error_code(), "FACE_DETECTION_ERROR");
        assert!(err.user_message().contains("model missing"));
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "log.txt");
        let err: ShieldError = io_err.into();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let err = ShieldError::from(io::Error::new(io::ErrorKind::Other, "disk full"));
        let details = err.detailed_message();
        assert!(details.starts_with("IO error: disk full"));
        assert!(details.contains("Caused by: disk full"));
    }

    #[test]
    fn test_config_error_metadata() {
        let err = ShieldError::Config("IMAGESHIELD_MAX_INPUT_MB must be greater than zero".to_string());
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert!(err.detailed_message().starts_with("Configuration error:"));
    }
}
