// Loads config on startup, loads/saves the session on startup and quit.
// Everything lives in <project_dir>/.wavepaint/
use std::path::{Path, PathBuf};
use anyhow::Context;
use crate::pipeline::project::{EngineConfig, SessionState};

pub const WAVEPAINT_DIR: &str = ".wavepaint";
const CONFIG_FILE: &str = "config.json";
const SESSION_FILE: &str = "session.json";
const LOG_FILE: &str = "wavepaint.log";

fn state_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(WAVEPAINT_DIR)
}

pub fn log_file_path(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(LOG_FILE)
}

// A missing config means defaults; a broken one is reported and replaced by defaults
pub fn load_config(project_dir: &Path) -> EngineConfig {
    let path = state_dir(project_dir).join(CONFIG_FILE);
    if !path.exists() {
        return EngineConfig::default();
    }
    match read_config(&path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring {}: {e:#}", path.display());
            EngineConfig::default()
        }
    }
}

fn read_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let data = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&data).context("parse config")?;
    config.validate()?;
    Ok(config)
}

pub fn load_session(project_dir: &Path) -> Option<SessionState> {
    let path = state_dir(project_dir).join(SESSION_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(session) => Some(session),
        Err(e) => {
            log::warn!("ignoring {}: {e}", path.display());
            None
        }
    }
}

// Save the session to disk, making the directory if it doesn't exist already
pub fn save_session(project_dir: &Path, session: &SessionState) -> anyhow::Result<()> {
    let dir = state_dir(project_dir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create {}", dir.display()))?;
    let json = serde_json::to_string_pretty(session)?;
    std::fs::write(dir.join(SESSION_FILE), json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Tool;

    fn scratch_project(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wavepaint-persist-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn session_round_trips() {
        let dir = scratch_project("session");
        assert!(load_session(&dir).is_none());

        let session = SessionState {
            brush_intensity: 0.25,
            tool: Tool::AddSquare,
            ..SessionState::default()
        };
        save_session(&dir, &session).unwrap();
        assert_eq!(load_session(&dir), Some(session));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn broken_config_falls_back_to_defaults() {
        let dir = scratch_project("config");
        assert_eq!(load_config(&dir), EngineConfig::default());

        std::fs::create_dir_all(dir.join(WAVEPAINT_DIR)).unwrap();
        let path = dir.join(WAVEPAINT_DIR).join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&dir), EngineConfig::default());

        std::fs::write(&path, r#"{ "amplitude": 7.0 }"#).unwrap();
        assert_eq!(load_config(&dir), EngineConfig::default());

        // would never fit in memory
        std::fs::write(&path, r#"{ "loop_seconds": 1e12 }"#).unwrap();
        assert_eq!(load_config(&dir), EngineConfig::default());

        std::fs::write(&path, r#"{ "loop_seconds": 1.0 }"#).unwrap();
        assert_eq!(load_config(&dir).buffer_len(), 48_000);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
