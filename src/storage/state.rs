use crate::app::LauncherSelection;
use crate::error::{PicamError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const STATE_FILE: &str = "state.json";

/// Launcher state that survives restarts, stored as `state.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub device_id: String,
    pub launcher_selection: LauncherSelection,
    pub photos_taken: u64,
    pub camera_overlay_visible: bool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            device_id: uuid::Uuid::new_v4().to_string(),
            launcher_selection: LauncherSelection::Camera,
            photos_taken: 0,
            camera_overlay_visible: true,
        }
    }
}

impl PersistedState {
    pub fn path(state_dir: &Path) -> PathBuf {
        state_dir.join(STATE_FILE)
    }

    /// Load the state, falling back to fresh defaults when missing or unreadable.
    ///
    /// Returns the state and whether it was newly created.
    pub fn load(state_dir: &Path) -> (Self, bool) {
        let path = Self::path(state_dir);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No saved state at {}, starting fresh", path.display());
                return (Self::default(), true);
            }
            Err(e) => {
                warn!("Failed to read {}: {}, using defaults", path.display(), e);
                return (Self::default(), true);
            }
        };

        match serde_json::from_str::<PersistedState>(&contents) {
            Ok(mut state) => {
                if state.device_id.trim().is_empty() {
                    state.device_id = uuid::Uuid::new_v4().to_string();
                }
                debug!("Loaded state from {}", path.display());
                (state, false)
            }
            Err(e) => {
                warn!("Corrupt state file {}: {}, using defaults", path.display(), e);
                (Self::default(), true)
            }
        }
    }

    /// Write the state through a temporary file and rename
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        fs::create_dir_all(state_dir)?;
        let path = Self::path(state_dir);
        let tmp = state_dir.join(format!("{}.tmp", STATE_FILE));

        let json = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            PicamError::Io(e)
        })?;

        debug!("Saved state to {}", path.display());
        Ok(())
    }
}
