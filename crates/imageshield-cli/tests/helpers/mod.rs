//! Test helpers: build a Toolkit over a temporary directory.
//!
//! Run from workspace root: `cargo test -p imageshield-cli --test toolkit_test`.

#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageshield_cli::Toolkit;
use imageshield_infra::ActivityLog;
use imageshield_processing::{
    FaceAnonymizer, FaceDetector, FaceRegion, PrivacyFilter, ProcessingError, WatermarkFont,
    Watermarker,
};
use tempfile::TempDir;

/// Reports the same regions for every image.
pub struct FixedDetector(pub Vec<FaceRegion>);

impl FaceDetector for FixedDetector {
    fn detect(&self, _gray: &GrayImage) -> Result<Vec<FaceRegion>, ProcessingError> {
        Ok(self.0.clone())
    }
}

/// Test toolkit and the directory holding its log and outputs.
pub struct TestToolkit {
    pub toolkit: Toolkit,
    pub temp_dir: TempDir,
}

impl TestToolkit {
    pub fn log_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("log.txt")
    }

    pub fn output_dir(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("out")
    }
}

pub fn setup_toolkit(anonymizer: FaceAnonymizer) -> TestToolkit {
    let temp_dir = TempDir::new().expect("temp dir");
    let toolkit = Toolkit::new(
        anonymizer,
        Watermarker::new(WatermarkFont::Builtin),
        PrivacyFilter::seeded(11),
        ActivityLog::new(temp_dir.path().join("log.txt")),
        temp_dir.path().join("out"),
    );
    TestToolkit { toolkit, temp_dir }
}

pub fn setup_with_face(face: FaceRegion) -> TestToolkit {
    setup_toolkit(FaceAnonymizer::new(Box::new(FixedDetector(vec![face]))))
}

/// Striped test image with enough detail for blurs to show.
pub fn striped_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        if (x + y) % 4 < 2 {
            Rgb([230, 180, 120])
        } else {
            Rgb([20, 40, 60])
        }
    }))
}
