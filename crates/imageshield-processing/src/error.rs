use imageshield_core::ShieldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("input is empty")]
    EmptyInput,

    #[error("input is {size} bytes, limit is {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },

    #[error("unsupported image format, expected JPEG or PNG")]
    UnsupportedFormat,

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("intensity must be greater than 0 for {mode}, got {intensity}")]
    InvalidIntensity { mode: &'static str, intensity: u32 },

    #[error("no face detector is configured")]
    DetectorUnavailable,

    #[error("face detector failed: {0}")]
    Detector(String),

    #[error("failed to load face model: {0}")]
    Model(String),

    #[error("noise distribution rejected: {0}")]
    Noise(String),
}

impl From<ProcessingError> for ShieldError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::EmptyInput
            | ProcessingError::InputTooLarge { .. }
            | ProcessingError::UnsupportedFormat
            | ProcessingError::InvalidIntensity { .. } => ShieldError::InvalidInput(err.to_string()),
            ProcessingError::DetectorUnavailable
            | ProcessingError::Detector(_)
            | ProcessingError::Model(_) => ShieldError::FaceDetection(err.to_string()),
            ProcessingError::Decode(_) | ProcessingError::Encode(_) | ProcessingError::Noise(_) => {
                ShieldError::ImageProcessing(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageshield_core::ErrorMetadata;

    #[test]
    fn test_invalid_intensity_maps_to_invalid_input() {
        let err: ShieldError = ProcessingError::InvalidIntensity {
            mode: "pixelate",
            intensity: 0,
        }
        .into();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.to_string().contains("pixelate"));
    }

    #[test]
    fn test_detector_errors_map_to_face_detection() {
        let err: ShieldError = ProcessingError::DetectorUnavailable.into();
        assert_eq!(err.error_code(), "FACE_DETECTION_ERROR");
    }
}
