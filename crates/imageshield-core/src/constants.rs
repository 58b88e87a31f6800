//! Application-wide constants

/// Product name used in headers and the exported log report.
pub const APP_NAME: &str = "ImageShield";

/// Default activity log location, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "log.txt";

/// File name offered when exporting the activity log as text.
pub const LOG_REPORT_FILE_NAME: &str = "ImageShield_Log.txt";

/// Wall-clock format of activity log timestamps (second precision).
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default upper bound for an input image file.
pub const DEFAULT_MAX_INPUT_MB: usize = 25;

/// Default watermark text.
pub const DEFAULT_WATERMARK_TEXT: &str = "SAFE SHARE";

/// Default watermark glyph alpha.
pub const DEFAULT_WATERMARK_OPACITY: u8 = 100;

/// Largest accepted watermark rotation in degrees.
pub const MAX_WATERMARK_ANGLE: u16 = 90;

/// Default privacy filter intensity.
pub const DEFAULT_PRIVACY_INTENSITY: u32 = 10;

/// Summary panel line shown before any module ran.
pub const EMPTY_SUMMARY: &str = "No protections applied yet.";
