use serde::{Deserialize, Serialize};
use std::fmt;

/// The three protection modules offered by the toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolModule {
    /// Face detection and blurring
    CleanScan,
    /// Metadata stripping and text watermark
    SafeShare,
    /// Pixelate / noise / blur privacy filters
    NoiseGuard,
}

impl ToolModule {
    pub const ALL: [ToolModule; 3] = [
        ToolModule::CleanScan,
        ToolModule::SafeShare,
        ToolModule::NoiseGuard,
    ];

    /// Name written to the activity log and the summary panel.
    pub fn name(self) -> &'static str {
        match self {
            ToolModule::CleanScan => "CleanScan",
            ToolModule::SafeShare => "SafeShare",
            ToolModule::NoiseGuard => "NoiseGuard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|module| module.name().eq_ignore_ascii_case(s.trim()))
    }

    /// File name of the downloadable PNG produced by this module.
    ///
    /// `variant` is the privacy mode for NoiseGuard and ignored otherwise.
    pub fn output_file_name(self, variant: Option<&str>) -> String {
        match self {
            ToolModule::CleanScan => "cleanscan.png".to_string(),
            ToolModule::SafeShare => "safeshare.png".to_string(),
            ToolModule::NoiseGuard => match variant {
                Some(mode) => format!("noiseguard_{}.png", mode),
                None => "noiseguard.png".to_string(),
            },
        }
    }
}

impl fmt::Display for ToolModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a best-effort protection does when it fails internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Return the input unchanged and only record a diagnostic.
    #[default]
    FailOpen,
    /// Surface the failure to the caller.
    FailClosed,
}

impl FailurePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "fail-open" | "open" => Some(FailurePolicy::FailOpen),
            "fail-closed" | "closed" => Some(FailurePolicy::FailClosed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailurePolicy::FailOpen => "fail-open",
            FailurePolicy::FailClosed => "fail-closed",
        }
    }
}
