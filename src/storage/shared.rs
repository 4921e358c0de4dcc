//! Thread-safe handle to the session's record store
//!
//! The front end mutates through [`SharedRecordStore::write`]; pipeline stages
//! read through [`SharedRecordStore::snapshot`], so a serialization never
//! observes a half-applied mutation.

use super::RecordStore;
use crate::types::AppointmentRecord;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable `Arc<RwLock<RecordStore>>` wrapper.
#[derive(Debug, Clone, Default)]
pub struct SharedRecordStore {
    inner: Arc<RwLock<RecordStore>>,
}

impl SharedRecordStore {
    pub fn new(store: RecordStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, RecordStore> {
        self.inner.read().unwrap_or_else(|e| {
            tracing::warn!("RwLock poisoned on RecordStore read, recovering");
            e.into_inner()
        })
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, RecordStore> {
        self.inner.write().unwrap_or_else(|e| {
            tracing::warn!("RwLock poisoned on RecordStore write, recovering");
            e.into_inner()
        })
    }

    /// Copy of the records taken under the read lock.
    pub fn snapshot(&self) -> Vec<AppointmentRecord> {
        self.read().snapshot()
    }
}

impl From<RecordStore> for SharedRecordStore {
    fn from(store: RecordStore) -> Self {
        Self::new(store)
    }
}
