// ── Persistence seam ──
//
// Durable storage is external. The core reports every credential
// change and every fresh snapshot through `StateStore`; a restart can
// then resume without a new login while the refresh window is open.

use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::CoreError;
use crate::model::{Credential, InventorySnapshot};

pub trait StateStore: Send + Sync {
    fn save_credential(&self, credential: &Credential) -> Result<(), CoreError>;
    fn save_snapshot(&self, snapshot: &InventorySnapshot) -> Result<(), CoreError>;
}

/// Keeps the latest state in memory. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    credential: RwLock<Option<Credential>>,
    snapshot: RwLock<Option<InventorySnapshot>>,
    credential_saves: AtomicUsize,
    snapshot_saves: AtomicUsize,
}

impl MemoryStateStore {
    pub fn credential(&self) -> Option<Credential> {
        self.credential
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn snapshot(&self) -> Option<InventorySnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn credential_saves(&self) -> usize {
        self.credential_saves.load(Ordering::Relaxed)
    }

    pub fn snapshot_saves(&self) -> usize {
        self.snapshot_saves.load(Ordering::Relaxed)
    }
}

impl StateStore for MemoryStateStore {
    fn save_credential(&self, credential: &Credential) -> Result<(), CoreError> {
        *self
            .credential
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(credential.clone());
        self.credential_saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn save_snapshot(&self, snapshot: &InventorySnapshot) -> Result<(), CoreError> {
        *self
            .snapshot
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(snapshot.clone());
        self.snapshot_saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
