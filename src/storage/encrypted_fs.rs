// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Envelope file operations: exclusive create, read and rewrite.
//!
//! ## Write Sequence
//!
//! Both create and rewrite write the envelope in four steps: IV, ciphertext,
//! digest, checksum. A step that does not transfer its full byte count fails
//! the operation immediately. A failed create leaves whatever was written in
//! place; the next read reports it as corruption.
//!
//! Rewrite stages the new envelope in a sibling file and renames it over the
//! old one, so a crash mid-write leaves the previous envelope intact.
//!
//! Files are created with mode `0600`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use super::envelope::{Envelope, MIN_ENVELOPE_LEN};
use super::error::{StoreError, StoreResult};
use super::StoragePaths;

/// Handle to the single envelope file.
#[derive(Debug, Clone)]
pub struct EnvelopeFile {
    paths: StoragePaths,
}

impl EnvelopeFile {
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Whether the envelope file exists, which is whether the record exists.
    pub fn exists(&self) -> bool {
        File::open(self.paths.envelope()).is_ok()
    }

    /// Create the envelope file; fails if it already exists.
    pub fn atomic_create(&self, envelope: &Envelope) -> StoreResult<()> {
        let path = self.paths.envelope();
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        owner_only(&mut options);

        let mut file = options.open(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                StoreError::AlreadyExists
            } else {
                StoreError::io(format!("Failed to create {}", path.display()), e)
            }
        })?;

        write_envelope(&mut file, envelope)?;
        file.sync_all()
            .map_err(|e| StoreError::io("Envelope sync failed", e))?;
        Ok(())
    }

    /// Read the envelope; fails if absent or shorter than the minimum size.
    pub fn read(&self) -> StoreResult<Envelope> {
        let path = self.paths.envelope();
        let mut file = File::open(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StoreError::NotFound
            } else {
                StoreError::io(format!("Failed to open {}", path.display()), e)
            }
        })?;

        let len = file
            .metadata()
            .map_err(|e| StoreError::io("Failed to stat envelope", e))?
            .len();
        if len < MIN_ENVELOPE_LEN as u64 {
            return Err(StoreError::corruption(format!(
                "Invalid file size: {len} bytes, minimum {MIN_ENVELOPE_LEN}"
            )));
        }

        let mut bytes = Vec::with_capacity(len as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| StoreError::io("Envelope read failed", e))?;
        Envelope::from_bytes(&bytes)
    }

    /// Replace the envelope contents.
    pub fn rewrite(&self, envelope: &Envelope) -> StoreResult<()> {
        let staging = self.paths.envelope_staging();
        let result = self.stage_and_swap(&staging, envelope);
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result
    }

    fn stage_and_swap(&self, staging: &Path, envelope: &Envelope) -> StoreResult<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        owner_only(&mut options);

        {
            let mut file = options
                .open(staging)
                .map_err(|e| StoreError::io("Failed to open staging file", e))?;
            write_envelope(&mut file, envelope)?;
            file.sync_all()
                .map_err(|e| StoreError::io("Envelope sync failed", e))?;
        }

        fs::rename(staging, self.paths.envelope())
            .map_err(|e| StoreError::io("Envelope replace failed", e))?;
        sync_dir(self.paths.root())
    }

    /// Check that the data directory accepts writes.
    pub fn health_check(&self) -> StoreResult<()> {
        let probe = self.paths.root().join(".health_check");
        let data = b"health_check_data";

        fs::write(&probe, data).map_err(|e| StoreError::io("Health probe write failed", e))?;
        let read_back =
            fs::read(&probe).map_err(|e| StoreError::io("Health probe read failed", e))?;
        fs::remove_file(&probe).map_err(|e| StoreError::io("Health probe cleanup failed", e))?;

        if read_back != data {
            return Err(StoreError::corruption("Health check data mismatch"));
        }
        Ok(())
    }
}

fn write_step(file: &mut File, data: &[u8], context: &str) -> StoreResult<()> {
    file.write_all(data).map_err(|e| StoreError::io(context, e))
}

fn write_envelope(file: &mut File, envelope: &Envelope) -> StoreResult<()> {
    write_step(file, &envelope.iv, "IV write failed")?;
    write_step(file, &envelope.ciphertext, "Data write failed")?;
    write_step(file, &envelope.tag.digest, "SHA-256 write failed")?;
    write_step(file, &envelope.tag.checksum.to_le_bytes(), "CRC32 write failed")?;
    file.flush().map_err(|e| StoreError::io("Envelope flush failed", e))
}

#[cfg(unix)]
fn owner_only(options: &mut OpenOptions) {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600);
}

#[cfg(not(unix))]
fn owner_only(_options: &mut OpenOptions) {}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> StoreResult<()> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| StoreError::io("Directory sync failed", e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> StoreResult<()> {
    Ok(())
}
