//! The public key table.
//!
//! A dense table indexed directly by trust level: level 1 lives in slot 1,
//! so slot 0 always exists and is always empty. The verifier compiled
//! against the generated table relies on this layout.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::artifact::public::{self, TableParseError};
use crate::keyspec::TrustLevel;

/// Errors loading a previously generated public key table.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read public key file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse public key file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: TableParseError,
    },
}

/// One slot of the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEntry {
    /// PEM-encoded public key, or `None` for an unused slot.
    pub public_key: Option<Vec<u8>>,
    /// Seconds since the Unix epoch; 0 for an unused slot.
    pub generated_at: u64,
}

impl KeyEntry {
    pub fn new(public_key: Vec<u8>, generated_at: u64) -> Self {
        Self {
            public_key: Some(public_key),
            generated_at,
        }
    }

    /// An unused slot.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.public_key.is_none()
    }
}

/// Public keys by trust level, loaded once, updated in memory, written once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRegistry {
    entries: Vec<KeyEntry>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the table from a previously generated public key file.
    pub fn load_existing(path: &Path) -> Result<Self, RegistryError> {
        let text = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let entries = public::parse(&text).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut registry = Self::new();
        registry.record_keys(entries);
        debug!(
            path = %path.display(),
            slots = registry.len(),
            keys = registry.populated().count(),
            "loaded existing public keys"
        );
        Ok(registry)
    }

    /// Fold in a table of known keys, slot by slot.
    ///
    /// Only populated entries are recorded; an empty slot in `entries`
    /// never clears a key already held here.
    pub fn record_keys(&mut self, entries: impl IntoIterator<Item = KeyEntry>) {
        for (index, entry) in entries.into_iter().enumerate() {
            if !entry.is_empty() {
                self.put(index, entry);
            }
        }
    }

    /// Store the key for `level`, replacing whatever was there.
    pub fn set_key(&mut self, level: TrustLevel, public_key: Vec<u8>, generated_at: u64) {
        self.put(level.index(), KeyEntry::new(public_key, generated_at));
    }

    fn put(&mut self, index: usize, entry: KeyEntry) {
        if self.entries.len() <= index {
            self.entries.resize_with(index + 1, KeyEntry::empty);
        }
        self.entries[index] = entry;
    }

    /// Table length: highest populated index + 1.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&KeyEntry> {
        self.entries.get(index)
    }

    /// Every slot in index order, placeholders included.
    pub fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }

    /// `(index, public key, generated_at)` for every populated slot.
    pub fn populated(&self) -> impl Iterator<Item = (usize, &[u8], u64)> {
        self.entries.iter().enumerate().filter_map(|(i, e)| {
            e.public_key
                .as_deref()
                .map(|key| (i, key, e.generated_at))
        })
    }
}
