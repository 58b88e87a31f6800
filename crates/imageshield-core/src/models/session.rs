//! Per-session state behind the summary panel
//!
//! The orchestrator takes a [`SessionState`] by value and hands back the
//! updated one; nothing here is global.

use serde::{Deserialize, Serialize};

use crate::constants::EMPTY_SUMMARY;
use crate::models::tool::ToolModule;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanScanRun {
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeShareRun {
    pub text: String,
    pub opacity: u8,
    pub angle: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseGuardRun {
    pub mode: String,
    pub intensity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub selected: Option<ToolModule>,
    pub cleanscan: Option<CleanScanRun>,
    pub safeshare: Option<SafeShareRun>,
    pub noiseguard: Option<NoiseGuardRun>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, module: ToolModule) -> Self {
        self.selected = Some(module);
        self
    }

    pub fn record_cleanscan(mut self, details: impl Into<String>) -> Self {
        self.cleanscan = Some(CleanScanRun {
            details: details.into(),
        });
        self
    }

    pub fn record_safeshare(mut self, text: impl Into<String>, opacity: u8, angle: u16) -> Self {
        self.safeshare = Some(SafeShareRun {
            text: text.into(),
            opacity,
            angle,
        });
        self
    }

    pub fn record_noiseguard(mut self, mode: impl Into<String>, intensity: u32) -> Self {
        self.noiseguard = Some(NoiseGuardRun {
            mode: mode.into(),
            intensity,
        });
        self
    }

    pub fn has_run(&self, module: ToolModule) -> bool {
        match module {
            ToolModule::CleanScan => self.cleanscan.is_some(),
            ToolModule::SafeShare => self.safeshare.is_some(),
            ToolModule::NoiseGuard => self.noiseguard.is_some(),
        }
    }

    /// Forget every recorded run. The module selection is kept.
    pub fn reset_runs(mut self) -> Self {
        self.cleanscan = None;
        self.safeshare = None;
        self.noiseguard = None;
        self
    }

    /// Lines of the summary panel, in module order.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut summary = Vec::new();

        if let Some(run) = &self.cleanscan {
            summary.push(format!("CleanScan: {}", run.details));
        }
        if let Some(run) = &self.safeshare {
            summary.push(format!(
                "SafeShare: Watermark '{}' with opacity {} and angle {}",
                run.text, run.opacity, run.angle
            ));
        }
        if let Some(run) = &self.noiseguard {
            summary.push(format!(
                "NoiseGuard: Mode '{}' with intensity {}",
                run.mode, run.intensity
            ));
        }

        if summary.is_empty() {
            summary.push(EMPTY_SUMMARY.to_string());
        }
        summary
    }
}
