// ── File-backed state store ──
//
// `<work_dir>/data/state.json` holds the credential and the latest
// inventory snapshot. Every save rewrites the whole file through a
// temp file and a rename, so a crash never leaves half a document.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use millheat_core::{CoreError, Credential, InventorySnapshot, StateStore};

use crate::ConfigError;

pub const STATE_DIR: &str = "data";
pub const STATE_FILE: &str = "state.json";

/// Everything the bridge persists between restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub auth: Credential,
    #[serde(default)]
    pub inventory: InventorySnapshot,
}

#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    state: Mutex<PersistedState>,
}

impl FileStateStore {
    /// Open the store under `work_dir`, loading existing state.
    ///
    /// A missing file yields an empty, never-authenticated state.
    pub fn open(work_dir: &Path) -> Result<Self, ConfigError> {
        let path = work_dir.join(STATE_DIR).join(STATE_FILE);
        let state = match fs::read(&path) {
            Ok(bytes) => {
                let state: PersistedState = serde_json::from_slice(&bytes)?;
                info!(
                    path = %path.display(),
                    auth_status = %state.auth.status,
                    devices = state.inventory.devices.len(),
                    "loaded persisted state"
                );
                state
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no persisted state; starting empty");
                PersistedState::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> PersistedState {
        self.lock().clone()
    }

    pub fn credential(&self) -> Credential {
        self.lock().auth.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PersistedState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut PersistedState)) -> Result<(), CoreError> {
        let mut state = self.lock();
        apply(&mut state);
        self.write(&state).map_err(|e| CoreError::Store {
            message: format!("{}: {e}", self.path.display()),
        })
    }

    fn write(&self, state: &PersistedState) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn save_credential(&self, credential: &Credential) -> Result<(), CoreError> {
        self.update(|state| state.auth = credential.clone())
    }

    fn save_snapshot(&self, snapshot: &InventorySnapshot) -> Result<(), CoreError> {
        self.update(|state| state.inventory = snapshot.clone())
    }
}
