//! CleanScan: face detection and region blurring

use image::{imageops, DynamicImage, GrayImage, ImageBuffer, Pixel};
use imageproc::filter::separable_filter_equal;
use imageshield_core::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{info, instrument, warn};

use crate::error::ProcessingError;

/// Kernel width of the face blur.
pub const FACE_BLUR_TAPS: usize = 99;
pub const FACE_BLUR_SIGMA: f32 = 30.0;

/// A detected face, in image pixel coordinates.
///
/// Detectors may report boxes that hang over the image edge, so the origin
/// is signed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub confidence: f64,
}

impl FaceRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence: 0.0,
        }
    }

    /// Intersect with an image of the given size.
    ///
    /// Returns `(x, y, width, height)` or `None` if nothing of the region is
    /// inside the image.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = i64::from(self.x).clamp(0, i64::from(image_width));
        let y0 = i64::from(self.y).clamp(0, i64::from(image_height));
        let x1 = (i64::from(self.x) + i64::from(self.width)).clamp(0, i64::from(image_width));
        let y1 = (i64::from(self.y) + i64::from(self.height)).clamp(0, i64::from(image_height));

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

/// Detector sensitivity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorSettings {
    /// Ratio between successive pyramid levels, > 1.
    pub scale_factor: f32,
    /// Smallest face side in pixels.
    pub min_face_size: u32,
    /// Minimum classifier score for a window to count as a face.
    pub score_threshold: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_face_size: 30,
            score_threshold: 2.0,
        }
    }
}

/// Pluggable face detection backend.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a grayscale image.
    fn detect(&self, gray: &GrayImage) -> Result<Vec<FaceRegion>, ProcessingError>;
}

/// Outcome of [`FaceAnonymizer::anonymize`].
#[derive(Debug, Clone)]
pub struct Anonymized {
    pub image: DynamicImage,
    pub faces: Vec<FaceRegion>,
    /// Set when detection failed and the input was passed through unchanged.
    pub fell_open: bool,
}

pub struct FaceAnonymizer {
    detector: Option<Box<dyn FaceDetector>>,
    policy: FailurePolicy,
}

impl FaceAnonymizer {
    pub fn new(detector: Box<dyn FaceDetector>) -> Self {
        Self {
            detector: Some(detector),
            policy: FailurePolicy::default(),
        }
    }

    /// An anonymizer with no detector. Every call fails, which under the
    /// fail-open policy means the input comes back unchanged.
    pub fn unavailable() -> Self {
        Self {
            detector: None,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn has_detector(&self) -> bool {
        self.detector.is_some()
    }

    /// Detect faces and blur each one. The input is never modified.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn anonymize(&self, image: &DynamicImage) -> Result<Anonymized, ProcessingError> {
        match self.detect_and_blur(image) {
            Ok((blurred, faces)) => {
                info!(faces = faces.len(), "Detected faces");
                Ok(Anonymized {
                    image: blurred,
                    faces,
                    fell_open: false,
                })
            }
            Err(e) => match self.policy {
                FailurePolicy::FailOpen => {
                    warn!(error = %e, "Face anonymization failed, returning image unchanged");
                    Ok(Anonymized {
                        image: image.clone(),
                        faces: Vec::new(),
                        fell_open: true,
                    })
                }
                FailurePolicy::FailClosed => Err(e),
            },
        }
    }

    fn detect_and_blur(
        &self,
        image: &DynamicImage,
    ) -> Result<(DynamicImage, Vec<FaceRegion>), ProcessingError> {
        let detector = self
            .detector
            .as_deref()
            .ok_or(ProcessingError::DetectorUnavailable)?;

        if image.width() == 0 || image.height() == 0 {
            return Ok((image.clone(), Vec::new()));
        }

        guarded(|| {
            let faces = detector.detect(&image.to_luma8())?;
            Ok((blur_regions(image, &faces), faces))
        })
    }
}

/// Run `step`, turning a panic inside it into a detector error.
fn guarded<T>(step: impl FnOnce() -> Result<T, ProcessingError>) -> Result<T, ProcessingError> {
    catch_unwind(AssertUnwindSafe(step))
        .map_err(|_| ProcessingError::Detector("face anonymization panicked".to_string()))?
}

/// Normalised 1-D Gaussian kernel.
fn gaussian_kernel(taps: usize, sigma: f32) -> Vec<f32> {
    let center = (taps / 2) as f32;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..taps)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / denom).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Blur every region of a copy of `image`. Later regions win where they overlap.
pub fn blur_regions(image: &DynamicImage, regions: &[FaceRegion]) -> DynamicImage {
    if regions.is_empty() {
        return image.clone();
    }

    let kernel = gaussian_kernel(FACE_BLUR_TAPS, FACE_BLUR_SIGMA);
    if image.color().has_alpha() {
        let mut buffer = image.to_rgba8();
        blur_buffer(&mut buffer, regions, &kernel);
        DynamicImage::ImageRgba8(buffer)
    } else {
        let mut buffer = image.to_rgb8();
        blur_buffer(&mut buffer, regions, &kernel);
        DynamicImage::ImageRgb8(buffer)
    }
}

fn blur_buffer<P>(buffer: &mut ImageBuffer<P, Vec<u8>>, regions: &[FaceRegion], kernel: &[f32])
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (width, height) = buffer.dimensions();
    for region in regions {
        let Some((x, y, w, h)) = region.clamp_to(width, height) else {
            continue;
        };
        let patch = imageops::crop_imm(&*buffer, x, y, w, h).to_image();
        let blurred = separable_filter_equal(&patch, kernel);
        imageops::replace(buffer, &blurred, i64::from(x), i64::from(y));
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Reports a fixed set of regions.
    pub struct StubDetector(pub Vec<FaceRegion>);

    impl FaceDetector for StubDetector {
        fn detect(&self, _gray: &GrayImage) -> Result<Vec<FaceRegion>, ProcessingError> {
            Ok(self.0.clone())
        }
    }

    pub struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(&self, _gray: &GrayImage) -> Result<Vec<FaceRegion>, ProcessingError> {
            Err(ProcessingError::Detector("corrupt buffer".to_string()))
        }
    }

    pub struct PanickingDetector;

    impl FaceDetector for PanickingDetector {
        fn detect(&self, _gray: &GrayImage) -> Result<Vec<FaceRegion>, ProcessingError> {
            panic!("cascade exploded")
        }
    }
}
