//! Command line overrides on top of the environment configuration

use imageshield_core::{Config, FailurePolicy, ShieldError};
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub log_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub face_model: Option<PathBuf>,
    pub font: Option<PathBuf>,
    pub fail_closed: bool,
}

impl ConfigOverrides {
    /// Replace every value given on the command line, then validate the
    /// result once.
    pub fn apply(self, mut config: Config) -> Result<Config, ShieldError> {
        if let Some(path) = self.log_path {
            config.log_path = path;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(model) = self.face_model {
            config.face_model_path = Some(model);
        }
        if let Some(font) = self.font {
            config.font_path = Some(font);
        }
        if self.fail_closed {
            config.face_failure_policy = FailurePolicy::FailClosed;
        }

        config
            .validate()
            .map_err(|e| ShieldError::Config(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn with_missing_model() -> Config {
        Config {
            face_model_path: Some(PathBuf::from("/nonexistent/seeta_fd_frontal_v1.0.bin")),
            ..Config::default()
        }
    }

    #[test]
    fn test_flag_replaces_bad_model_from_env() {
        let model = NamedTempFile::new().unwrap();
        let overrides = ConfigOverrides {
            face_model: Some(model.path().to_path_buf()),
            ..ConfigOverrides::default()
        };

        let config = overrides.apply(with_missing_model()).unwrap();
        assert_eq!(config.face_model_path.as_deref(), Some(model.path()));
    }

    #[test]
    fn test_bad_model_without_flag_is_config_error() {
        let err = ConfigOverrides::default()
            .apply(with_missing_model())
            .unwrap_err();
        assert!(matches!(err, ShieldError::Config(_)));
        assert!(err.to_string().contains("IMAGESHIELD_FACE_MODEL"));
    }

    #[test]
    fn test_missing_font_is_not_fatal() {
        let overrides = ConfigOverrides {
            font: Some(PathBuf::from("/nonexistent/font.ttf")),
            ..ConfigOverrides::default()
        };
        let config = overrides.apply(Config::default()).unwrap();
        assert!(config.font_path.is_some());
    }

    #[test]
    fn test_fail_closed_flag() {
        let overrides = ConfigOverrides {
            fail_closed: true,
            output_dir: Some(PathBuf::from("out")),
            ..ConfigOverrides::default()
        };
        let config = overrides.apply(Config::default()).unwrap();
        assert_eq!(config.face_failure_policy, FailurePolicy::FailClosed);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }
}
