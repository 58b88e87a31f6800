//! ImageShield command line toolkit
//!
//! [`Toolkit`] runs one protection module per call, writes the PNG result,
//! appends to the activity log and returns the updated [`SessionState`].
//!
//! [`SessionState`]: imageshield_core::SessionState

pub mod overrides;
pub mod report;
pub mod session_file;
pub mod toolkit;

pub use overrides::ConfigOverrides;
pub use toolkit::{ModuleRequest, RunReport, Toolkit};
