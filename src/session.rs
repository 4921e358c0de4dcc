//! Editing session: the shared roster plus the file it was opened from.

use crate::codec::{self, CodecError, LoadPolicy};
use crate::storage::SharedRecordStore;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no roster file is open; use save-as")]
    NoOpenFile,

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("cannot create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Default)]
pub struct Session {
    store: SharedRecordStore,
    opened_file: Option<PathBuf>,
}

impl Session {
    /// Empty roster with no backing file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` into a fresh session.
    pub fn open(path: &Path, policy: LoadPolicy) -> Result<Self, SessionError> {
        let mut session = Self::new();
        session.reopen(path, policy)?;
        Ok(session)
    }

    /// Like [`Session::open`], but a missing file gives an empty roster that
    /// will be saved to `path`.
    pub fn open_or_empty(path: &Path, policy: LoadPolicy) -> Result<Self, SessionError> {
        if path.exists() {
            return Self::open(path, policy);
        }
        warn!(path = %path.display(), "Roster file not found, starting with an empty roster");
        Ok(Self {
            store: SharedRecordStore::default(),
            opened_file: Some(path.to_path_buf()),
        })
    }

    /// Replace the current contents with `path`. On failure nothing changes.
    pub fn reopen(&mut self, path: &Path, policy: LoadPolicy) -> Result<(), SessionError> {
        let records = codec::load_from_file(path, policy)?;
        info!(path = %path.display(), records = records.len(), "Roster opened");
        {
            let mut store = self.store.write();
            store.replace_all(records);
            store.mark_saved();
        }
        self.opened_file = Some(path.to_path_buf());
        Ok(())
    }

    /// Write the roster back to the file it was opened from.
    pub fn save(&self) -> Result<PathBuf, SessionError> {
        let path = self.opened_file.clone().ok_or(SessionError::NoOpenFile)?;
        self.write_to(&path)?;
        Ok(path)
    }

    /// Write the roster to `path` and make it the opened file.
    pub fn save_as(&mut self, path: &Path) -> Result<(), SessionError> {
        self.write_to(path)?;
        self.opened_file = Some(path.to_path_buf());
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SessionError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        // Hold the write lock so no edit lands between encoding and mark_saved.
        let mut store = self.store.write();
        codec::save_to_file(path, store.records())?;
        store.mark_saved();
        info!(path = %path.display(), records = store.len(), "Roster saved");
        Ok(())
    }

    pub const fn store(&self) -> &SharedRecordStore {
        &self.store
    }

    pub fn opened_file(&self) -> Option<&Path> {
        self.opened_file.as_deref()
    }

    /// True when the roster has edits not yet written to disk.
    pub fn has_unsaved_changes(&self) -> bool {
        self.store.read().is_dirty()
    }
}
