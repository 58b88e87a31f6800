//! Reporting a failed command to the user and the log

use imageshield_core::{ErrorMetadata, LogLevel, ShieldError};

/// The first [`ShieldError`] in the chain of `err`.
fn shield_error(err: &anyhow::Error) -> Option<&ShieldError> {
    err.chain().find_map(|cause| cause.downcast_ref::<ShieldError>())
}

/// Message printed for a failed command. A [`ShieldError`] contributes its
/// user message, after any context added on top of it.
pub fn user_message(err: &anyhow::Error) -> String {
    let Some(shield) = shield_error(err) else {
        return format!("{:#}", err);
    };

    let is_outermost = err
        .chain()
        .next()
        .is_some_and(|outer| outer.downcast_ref::<ShieldError>().is_some());
    if is_outermost {
        shield.user_message()
    } else {
        format!("{}: {}", err, shield.user_message())
    }
}

/// Log the failure at the level its error asks for.
pub fn log_failure(err: &anyhow::Error) {
    let Some(shield) = shield_error(err) else {
        tracing::error!(error = %format!("{:#}", err), "Command failed");
        return;
    };

    let code = shield.error_code();
    let details = shield.detailed_message();
    match shield.log_level() {
        LogLevel::Debug => tracing::debug!(error_code = code, details = %details, "Command failed"),
        LogLevel::Warn => tracing::warn!(error_code = code, details = %details, "Command failed"),
        LogLevel::Error => tracing::error!(error_code = code, details = %details, "Command failed"),
    }
}
