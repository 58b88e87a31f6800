//! Optional persistence of the session state between CLI invocations

use imageshield_core::{SessionState, ShieldError};
use std::fs;
use std::io;
use std::path::Path;

/// Load the session saved at `path`. A missing file starts a fresh session.
pub fn load(path: &Path) -> Result<SessionState, ShieldError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(SessionState::new()),
        Err(e) => Err(e.into()),
    }
}

pub fn save(path: &Path, state: &SessionState) -> Result<(), ShieldError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(state)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageshield_core::ToolModule;

    #[test]
    fn test_missing_session_is_fresh() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = load(&dir.path().join("session.json")).unwrap();
        assert_eq!(state, SessionState::new());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let state = SessionState::new()
            .select(ToolModule::NoiseGuard)
            .record_noiseguard("noise", 25);

        save(&path, &state).unwrap();
        assert_eq!(load(&path).unwrap(), state);
    }

    #[test]
    fn test_corrupt_session_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        assert!(load(&path).is_err());
    }
}
