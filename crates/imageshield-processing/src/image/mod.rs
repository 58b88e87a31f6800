//! Image transformations
//!
//! - face detection and region blurring (face, rustface_backend)
//! - text watermarking (watermark, font)
//! - whole-image privacy filters (filters)

pub mod face;
pub mod filters;
pub mod font;
#[cfg(feature = "rustface")]
pub mod rustface_backend;
pub mod watermark;

pub use face::{Anonymized, FaceAnonymizer, FaceDetector, FaceRegion};
pub use filters::{PrivacyFilter, PrivacyMode};
pub use watermark::{WatermarkOptions, WatermarkPosition, Watermarker};
