use image::GrayImage;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::ProcessingError;
use crate::image::face::{DetectorSettings, FaceDetector, FaceRegion};

/// Face detector backed by the `rustface` crate (SeetaFace frontal cascade).
///
/// The model file is read once; each call builds a fresh detector from a
/// clone of it, so the type is `Sync` without locking.
pub struct RustfaceDetector {
    model: rustface::Model,
    settings: DetectorSettings,
}

impl RustfaceDetector {
    /// Load a SeetaFace model (`seeta_fd_frontal_v1.0.bin`) from disk.
    pub fn from_path(path: &Path) -> Result<Self, ProcessingError> {
        let file = File::open(path)
            .map_err(|e| ProcessingError::Model(format!("{}: {}", path.display(), e)))?;
        let model = rustface::read_model(BufReader::new(file))
            .map_err(|e| ProcessingError::Model(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "Loaded face model");
        Ok(Self {
            model,
            settings: DetectorSettings::default(),
        })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, gray: &GrayImage) -> Result<Vec<FaceRegion>, ProcessingError> {
        let (width, height) = gray.dimensions();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.settings.min_face_size);
        detector.set_score_thresh(self.settings.score_threshold);
        // rustface shrinks by this factor per level, so it is the inverse of
        // the usual "grow by" scale factor.
        detector.set_pyramid_scale_factor(1.0 / self.settings.scale_factor);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceRegion {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width(),
                    height: bbox.height(),
                    confidence: face.score(),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let result = RustfaceDetector::from_path(Path::new("/nonexistent/seeta.bin"));
        assert!(matches!(result, Err(ProcessingError::Model(_))));
    }
}
