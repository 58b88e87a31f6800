//! Configuration module
//!
//! Configuration is read from the environment (optionally seeded from a
//! `.env` file) and may be overridden field by field by the CLI.

use std::env;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_LOG_PATH, DEFAULT_MAX_INPUT_MB};
use crate::models::tool::FailurePolicy;

/// Output format of the tracing subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub log_path: PathBuf,
    pub output_dir: PathBuf,
    pub face_model_path: Option<PathBuf>,
    pub font_path: Option<PathBuf>,
    pub face_failure_policy: FailurePolicy,
    pub max_input_bytes: usize,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            output_dir: PathBuf::from("."),
            face_model_path: None,
            font_path: None,
            face_failure_policy: FailurePolicy::default(),
            max_input_bytes: DEFAULT_MAX_INPUT_MB * 1024 * 1024,
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Read the environment. Parse errors fail here; path checks are left to
    /// [`Config::validate`], which callers run once overrides are applied.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("IMAGESHIELD_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let face_failure_policy = match env::var("IMAGESHIELD_FACE_POLICY") {
            Ok(raw) => FailurePolicy::parse(&raw).ok_or_else(|| {
                anyhow::anyhow!(
                    "IMAGESHIELD_FACE_POLICY must be 'fail-open' or 'fail-closed', got '{}'",
                    raw
                )
            })?,
            Err(_) => FailurePolicy::default(),
        };

        let max_input_mb = env::var("IMAGESHIELD_MAX_INPUT_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_INPUT_MB.to_string())
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("IMAGESHIELD_MAX_INPUT_MB must be a valid number"))?;

        let log_format = env::var("IMAGESHIELD_LOG_FORMAT")
            .ok()
            .and_then(|s| LogFormat::parse(&s));

        let mut config = Config {
            environment,
            log_path: env::var("IMAGESHIELD_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_PATH)),
            output_dir: env::var("IMAGESHIELD_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            face_model_path: env::var("IMAGESHIELD_FACE_MODEL")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            font_path: env::var("IMAGESHIELD_FONT")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            face_failure_policy,
            max_input_bytes: max_input_mb * 1024 * 1024,
            log_format: log_format.unwrap_or_default(),
        };

        if log_format.is_none() && config.is_production() {
            config.log_format = LogFormat::Json;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.log_path.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("IMAGESHIELD_LOG_PATH must not be empty"));
        }

        if self.max_input_bytes == 0 {
            return Err(anyhow::anyhow!(
                "IMAGESHIELD_MAX_INPUT_MB must be greater than zero"
            ));
        }

        // A missing font is not checked: watermarking falls back to another.
        if let Some(model) = &self.face_model_path {
            ensure_file(model, "IMAGESHIELD_FACE_MODEL")?;
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

fn ensure_file(path: &Path, var: &str) -> Result<(), anyhow::Error> {
    if !path.is_file() {
        return Err(anyhow::anyhow!(
            "{} points to '{}', which is not a readable file",
            var,
            path.display()
        ));
    }
    Ok(())
}
