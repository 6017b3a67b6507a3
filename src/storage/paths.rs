// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the envelope file.

use std::path::{Path, PathBuf};

/// Default data directory (the process working directory).
pub const DATA_ROOT: &str = ".";

/// File name of the single envelope.
pub const ENVELOPE_FILE_NAME: &str = "car_detail.bin";

/// Storage path utilities for the vehicle store.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the envelope.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the envelope file.
    pub fn envelope(&self) -> PathBuf {
        self.root.join(ENVELOPE_FILE_NAME)
    }

    /// Staging file used while rewriting the envelope.
    pub fn envelope_staging(&self) -> PathBuf {
        self.root.join(format!("{ENVELOPE_FILE_NAME}.tmp"))
    }
}
