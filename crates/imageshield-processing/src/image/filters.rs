//! NoiseGuard: whole-image obfuscation filters

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, Pixel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

use crate::error::ProcessingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyMode {
    /// Bilinear downscale, nearest-neighbour upscale
    Pixelate,
    /// Zero-mean Gaussian noise per channel
    Noise,
    /// Gaussian blur
    Blur,
}

impl PrivacyMode {
    pub const ALL: [PrivacyMode; 3] = [PrivacyMode::Pixelate, PrivacyMode::Noise, PrivacyMode::Blur];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pixelate" => Some(PrivacyMode::Pixelate),
            "noise" => Some(PrivacyMode::Noise),
            "blur" => Some(PrivacyMode::Blur),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyMode::Pixelate => "pixelate",
            PrivacyMode::Noise => "noise",
            PrivacyMode::Blur => "blur",
        }
    }
}

impl fmt::Display for PrivacyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies one [`PrivacyMode`] uniformly across an image.
#[derive(Debug, Clone, Default)]
pub struct PrivacyFilter {
    seed: Option<u64>,
}

impl PrivacyFilter {
    /// Noise drawn from the OS entropy source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproducible noise: every call starts from the same seed.
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    /// Apply the filter named by `mode`. An unknown mode returns the input
    /// unchanged.
    pub fn apply(
        &self,
        image: &DynamicImage,
        mode: &str,
        intensity: u32,
    ) -> Result<DynamicImage, ProcessingError> {
        match PrivacyMode::parse(mode) {
            Some(mode) => self.apply_mode(image, mode, intensity),
            None => {
                debug!(mode = mode, "Unknown privacy mode, returning image unchanged");
                Ok(image.clone())
            }
        }
    }

    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn apply_mode(
        &self,
        image: &DynamicImage,
        mode: PrivacyMode,
        intensity: u32,
    ) -> Result<DynamicImage, ProcessingError> {
        match mode {
            PrivacyMode::Pixelate => pixelate(image, intensity),
            PrivacyMode::Noise => self.add_noise(image, intensity),
            PrivacyMode::Blur => Ok(blur(image, intensity)),
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    fn add_noise(&self, image: &DynamicImage, intensity: u32) -> Result<DynamicImage, ProcessingError> {
        if intensity == 0 {
            return Ok(image.clone());
        }

        let normal = Normal::new(0.0, f64::from(intensity))
            .map_err(|e| ProcessingError::Noise(e.to_string()))?;
        let mut rng = self.rng();

        Ok(match image {
            DynamicImage::ImageLuma8(buffer) => {
                DynamicImage::ImageLuma8(noisy(buffer.clone(), &normal, &mut rng))
            }
            DynamicImage::ImageLumaA8(buffer) => {
                DynamicImage::ImageLumaA8(noisy(buffer.clone(), &normal, &mut rng))
            }
            DynamicImage::ImageRgb8(buffer) => {
                DynamicImage::ImageRgb8(noisy(buffer.clone(), &normal, &mut rng))
            }
            DynamicImage::ImageRgba8(buffer) => {
                DynamicImage::ImageRgba8(noisy(buffer.clone(), &normal, &mut rng))
            }
            // Deeper formats are reduced to 8 bits per channel.
            other if other.color().has_alpha() => {
                DynamicImage::ImageRgba8(noisy(other.to_rgba8(), &normal, &mut rng))
            }
            other => DynamicImage::ImageRgb8(noisy(other.to_rgb8(), &normal, &mut rng)),
        })
    }
}

fn pixelate(image: &DynamicImage, intensity: u32) -> Result<DynamicImage, ProcessingError> {
    if intensity == 0 {
        return Err(ProcessingError::InvalidIntensity {
            mode: PrivacyMode::Pixelate.as_str(),
            intensity,
        });
    }

    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Ok(image.clone());
    }

    let small_width = (width / intensity).max(1);
    let small_height = (height / intensity).max(1);
    debug!(small_width, small_height, "Pixelating");

    Ok(image
        .resize_exact(small_width, small_height, FilterType::Triangle)
        .resize_exact(width, height, FilterType::Nearest))
}

fn blur(image: &DynamicImage, intensity: u32) -> DynamicImage {
    if intensity == 0 {
        return image.clone();
    }
    image.blur(intensity as f32)
}

/// Add one truncated normal sample to every channel value, clamped to 0..=255.
fn noisy<P>(
    mut buffer: ImageBuffer<P, Vec<u8>>,
    normal: &Normal<f64>,
    rng: &mut StdRng,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    for value in buffer.iter_mut() {
        let delta = normal.sample(rng) as i16;
        *value = (i16::from(*value) + delta).clamp(0, 255) as u8;
    }
    buffer
}
