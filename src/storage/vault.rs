// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Vehicle Store
//!
//! Entry point for every operation on the stored record.
//!
//! ## Serialization
//!
//! Create, Read and Update all run under one process-wide gate, held for the
//! whole operation. For Update that covers read, decrypt, verify, modify,
//! encrypt and rewrite, so two concurrent updates cannot lose each other's
//! changes and a read never observes a half-written envelope.
//!
//! Operations are synchronous: key derivation is CPU-bound and file I/O is
//! blocking. Async callers should run them on a blocking thread.

use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use crate::credentials::CredentialProvider;

use super::encrypted_fs::EnvelopeFile;
use super::envelope::Envelope;
use super::error::{StoreError, StoreResult};
use super::kdf::{derive_key, KdfParams, Secrets};
use super::patch::VehiclePatch;
use super::record::{VehicleInput, VehicleRecord};
use super::StoragePaths;

pub struct VehicleStore {
    file: EnvelopeFile,
    secrets: Secrets,
    kdf: KdfParams,
    credentials: Arc<dyn CredentialProvider>,
    gate: Mutex<()>,
}

impl VehicleStore {
    pub fn new(
        paths: StoragePaths,
        secrets: Secrets,
        kdf: KdfParams,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            file: EnvelopeFile::new(paths),
            secrets,
            kdf,
            credentials,
            gate: Mutex::new(()),
        }
    }

    pub fn paths(&self) -> &StoragePaths {
        self.file.paths()
    }

    /// Run `f` while holding the store gate.
    fn with_exclusive_access<T>(&self, f: impl FnOnce() -> StoreResult<T>) -> StoreResult<T> {
        // The guarded value is `()`, so a poisoned gate carries no broken state.
        let _guard = self
            .gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f()
    }

    /// Create the record. Fails with `AlreadyExists` if one is stored.
    pub fn create(&self, input: &VehicleInput) -> StoreResult<()> {
        self.with_exclusive_access(|| {
            if self.file.exists() {
                tracing::warn!("Create rejected: vehicle record already exists");
                return Err(StoreError::AlreadyExists);
            }

            let credentials = self.credentials.fetch()?;
            let record = VehicleRecord::validate(input, &credentials).inspect_err(|e| {
                tracing::warn!(error = %e, "Create rejected: invalid vehicle data");
            })?;

            let key = derive_key(&self.secrets, self.kdf);
            let envelope = Envelope::seal(&record, &key)?;
            self.file.atomic_create(&envelope)?;

            tracing::info!(vin = %record.vin, "Vehicle record created");
            Ok(())
        })
    }

    /// Decrypt and verify the stored record.
    pub fn read(&self) -> StoreResult<VehicleRecord> {
        self.with_exclusive_access(|| {
            let envelope = self.file.read()?;
            let key = derive_key(&self.secrets, self.kdf);
            let record = envelope.open(&key)?;
            tracing::debug!("Vehicle record read");
            Ok(record)
        })
    }

    /// Apply an update payload keyed by wire field names.
    ///
    /// The payload is fully validated before the stored record is touched.
    pub fn update(&self, payload: &Map<String, Value>) -> StoreResult<VehicleRecord> {
        let patch = VehiclePatch::from_json(payload).inspect_err(|e| {
            if let StoreError::Validation(_) = e {
                tracing::warn!(error = %e, "Update rejected: invalid field value");
            }
        })?;
        self.apply(&patch)
    }

    /// Apply a validated patch and re-seal the record under a fresh IV.
    pub fn apply(&self, patch: &VehiclePatch) -> StoreResult<VehicleRecord> {
        self.with_exclusive_access(|| {
            let envelope = self.file.read()?;
            let key = derive_key(&self.secrets, self.kdf);
            let mut record = envelope.open(&key)?;

            if patch.is_empty() {
                tracing::debug!("Empty update, re-sealing under a fresh IV");
            }
            patch.apply_to(&mut record);
            let sealed = Envelope::seal(&record, &key)?;
            self.file.rewrite(&sealed)?;

            tracing::info!(vin = %record.vin, "Vehicle record updated");
            Ok(record)
        })
    }

    /// Check that the data directory accepts writes.
    pub fn health_check(&self) -> StoreResult<()> {
        self.file.health_check()
    }
}
