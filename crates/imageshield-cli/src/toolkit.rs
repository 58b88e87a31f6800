//! Dispatch of one protection module per user action

use image::DynamicImage;
use imageshield_core::{Config, LogEntry, SessionState, ShieldError, ToolModule};
use imageshield_infra::ActivityLog;
use imageshield_processing::{
    codec, describe, FaceAnonymizer, FaceDetector, ImageMetadata, PrivacyFilter,
    ProcessingError, WatermarkOptions, Watermarker,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Which module to run, with its parameters.
#[derive(Debug, Clone)]
pub enum ModuleRequest {
    CleanScan,
    SafeShare(WatermarkOptions),
    NoiseGuard { mode: String, intensity: u32 },
}

impl ModuleRequest {
    pub fn module(&self) -> ToolModule {
        match self {
            ModuleRequest::CleanScan => ToolModule::CleanScan,
            ModuleRequest::SafeShare(_) => ToolModule::SafeShare,
            ModuleRequest::NoiseGuard { .. } => ToolModule::NoiseGuard,
        }
    }

    /// Free-text details recorded in the activity log.
    pub fn details(&self) -> String {
        match self {
            ModuleRequest::CleanScan => "Face blurring applied".to_string(),
            ModuleRequest::SafeShare(options) => format!(
                "Watermark: '{}', Opacity: {}, Angle: {}",
                options.text, options.opacity, options.angle
            ),
            ModuleRequest::NoiseGuard { mode, intensity } => {
                format!("Mode: {}, Intensity: {}", mode, intensity)
            }
        }
    }

    pub fn output_file_name(&self) -> String {
        match self {
            ModuleRequest::NoiseGuard { mode, .. } => self
                .module()
                .output_file_name(Some(&file_name_safe(mode))),
            _ => self.module().output_file_name(None),
        }
    }
}

/// Keep user-supplied mode names from escaping the output directory.
fn file_name_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Outcome of one [`Toolkit::run`].
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub module: ToolModule,
    pub output_path: PathBuf,
    pub entry: LogEntry,
    /// Faces found by CleanScan.
    pub faces: Option<usize>,
    /// CleanScan could not run and passed the image through unchanged.
    pub fell_open: bool,
    #[serde(skip)]
    pub image: DynamicImage,
}

pub struct Toolkit {
    anonymizer: FaceAnonymizer,
    watermarker: Watermarker,
    filter: PrivacyFilter,
    log: ActivityLog,
    output_dir: PathBuf,
    max_input_bytes: usize,
}

impl Toolkit {
    pub fn new(
        anonymizer: FaceAnonymizer,
        watermarker: Watermarker,
        filter: PrivacyFilter,
        log: ActivityLog,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            anonymizer,
            watermarker,
            filter,
            log,
            output_dir: output_dir.into(),
            max_input_bytes: usize::MAX,
        }
    }

    /// Build every component from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ShieldError> {
        let anonymizer = build_anonymizer(config)?;
        let watermarker = Watermarker::with_font_path(config.font_path.as_deref());
        tracing::debug!(
            face_detector = anonymizer.has_detector(),
            font = ?watermarker.font(),
            "Toolkit ready"
        );

        Ok(Self::new(
            anonymizer,
            watermarker,
            PrivacyFilter::new(),
            ActivityLog::new(&config.log_path),
            &config.output_dir,
        )
        .with_max_input_bytes(config.max_input_bytes))
    }

    pub fn with_max_input_bytes(mut self, max_input_bytes: usize) -> Self {
        self.max_input_bytes = max_input_bytes;
        self
    }

    pub fn activity_log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Read an input image fully into memory and decode it.
    pub fn load_image(&self, path: &Path) -> Result<DynamicImage, ShieldError> {
        let data = fs::read(path)?;
        Ok(codec::decode(&data, self.max_input_bytes)?)
    }

    /// Dimensions, format and EXIF fields of an image file.
    pub fn inspect(&self, path: &Path) -> Result<ImageMetadata, ShieldError> {
        let data = fs::read(path)?;
        Ok(describe(&data)?)
    }

    /// Run exactly one module on `image`, write its PNG and log the run.
    pub fn run(
        &self,
        state: SessionState,
        request: &ModuleRequest,
        image: &DynamicImage,
    ) -> Result<(SessionState, RunReport), ShieldError> {
        let module = request.module();
        let state = state.select(module);
        tracing::info!(module = %module, "Running module");

        let mut faces = None;
        let mut fell_open = false;
        let output = match request {
            ModuleRequest::CleanScan => {
                let anonymized = self.anonymizer.anonymize(image)?;
                faces = Some(anonymized.faces.len());
                fell_open = anonymized.fell_open;
                anonymized.image
            }
            ModuleRequest::SafeShare(options) => self.watermarker.watermark(image, options),
            ModuleRequest::NoiseGuard { mode, intensity } => {
                self.filter.apply(image, mode, *intensity)?
            }
        };

        let png = codec::encode_png(&output)?;
        fs::create_dir_all(&self.output_dir)?;
        let output_path = self.output_dir.join(request.output_file_name());
        fs::write(&output_path, &png)?;

        let entry = LogEntry::now(module, request.details());
        self.log.append(&entry)?;

        let state = match request {
            ModuleRequest::CleanScan => state.record_cleanscan(entry.details.clone()),
            ModuleRequest::SafeShare(options) => {
                state.record_safeshare(options.text.clone(), options.opacity, options.angle)
            }
            ModuleRequest::NoiseGuard { mode, intensity } => {
                state.record_noiseguard(mode.clone(), *intensity)
            }
        };

        tracing::info!(
            module = %module,
            output = %output_path.display(),
            bytes = png.len(),
            "Module finished"
        );

        Ok((
            state,
            RunReport {
                module,
                output_path,
                entry,
                faces,
                fell_open,
                image: output,
            },
        ))
    }

    pub fn history(&self) -> Result<Vec<LogEntry>, ShieldError> {
        self.log.entries()
    }

    /// Write the plain-text log report to `destination`.
    pub fn export_history(&self, destination: &Path) -> Result<usize, ShieldError> {
        let report = self.log.export_text()?;
        fs::write(destination, &report)?;
        Ok(report.lines().count())
    }

    /// Delete the activity log and forget every recorded run.
    pub fn clear_history(&self, state: SessionState) -> Result<SessionState, ShieldError> {
        self.log.clear()?;
        Ok(state.reset_runs())
    }
}

fn build_anonymizer(config: &Config) -> Result<FaceAnonymizer, ShieldError> {
    let policy = config.face_failure_policy;
    let Some(path) = config.face_model_path.as_deref() else {
        tracing::debug!("No face model configured");
        return Ok(FaceAnonymizer::unavailable().with_policy(policy));
    };

    match load_detector(path) {
        Ok(detector) => Ok(FaceAnonymizer::new(detector).with_policy(policy)),
        Err(e) if policy == imageshield_core::FailurePolicy::FailOpen => {
            tracing::warn!(error = %e, "Face model unusable, CleanScan will pass images through");
            Ok(FaceAnonymizer::unavailable().with_policy(policy))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(feature = "rustface")]
fn load_detector(path: &Path) -> Result<Box<dyn FaceDetector>, ProcessingError> {
    Ok(Box::new(imageshield_processing::RustfaceDetector::from_path(path)?))
}

#[cfg(not(feature = "rustface"))]
fn load_detector(_path: &Path) -> Result<Box<dyn FaceDetector>, ProcessingError> {
    Err(ProcessingError::Model(
        "built without the rustface feature".to_string(),
    ))
}
