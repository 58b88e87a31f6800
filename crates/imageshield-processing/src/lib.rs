//! ImageShield processing
//!
//! The three privacy components, each a stateless transformation from one
//! image to a new one:
//! - [`FaceAnonymizer`] (CleanScan): detect faces and blur each region
//! - [`Watermarker`] (SafeShare): drop metadata and overlay a text watermark
//! - [`PrivacyFilter`] (NoiseGuard): pixelate, add noise or blur the whole image
//!
//! plus metadata inspection and the codec helpers used by the orchestrator.

pub mod codec;
pub mod error;
pub mod image;
pub mod metadata;

pub use codec::{decode, encode_png};
pub use error::ProcessingError;
pub use crate::image::face::{Anonymized, DetectorSettings, FaceAnonymizer, FaceDetector, FaceRegion};
pub use crate::image::filters::{PrivacyFilter, PrivacyMode};
pub use crate::image::font::WatermarkFont;
pub use crate::image::watermark::{placement, TextLayout, WatermarkOptions, WatermarkPosition, Watermarker};
pub use metadata::{describe, read_exif, ExifField, ImageMetadata};

#[cfg(feature = "rustface")]
pub use crate::image::rustface_backend::RustfaceDetector;
