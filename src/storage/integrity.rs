// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Plaintext integrity values: SHA-256 digest plus CRC-32 checksum.
//!
//! Both are computed over the serialized record, not the ciphertext. They
//! detect corruption; they do not authenticate the envelope.

use sha2::{Digest, Sha256};

use super::error::{StoreError, StoreResult};
use super::record::RECORD_SIZE;

pub const DIGEST_LEN: usize = 32;
pub const CHECKSUM_LEN: usize = 4;

/// Digest and checksum of one serialized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityTag {
    pub digest: [u8; DIGEST_LEN],
    pub checksum: u32,
}

impl IntegrityTag {
    pub fn compute(plaintext: &[u8; RECORD_SIZE]) -> Self {
        Self {
            digest: digest(plaintext),
            checksum: checksum(plaintext),
        }
    }

    /// Recompute over `plaintext` and compare against the stored values.
    pub fn verify(&self, plaintext: &[u8; RECORD_SIZE]) -> StoreResult<()> {
        let computed = Self::compute(plaintext);
        if computed.digest != self.digest {
            tracing::error!("Stored vehicle record failed SHA-256 verification");
            return Err(StoreError::corruption("SHA-256 mismatch"));
        }
        if computed.checksum != self.checksum {
            tracing::error!("Stored vehicle record failed CRC32 verification");
            return Err(StoreError::corruption("CRC32 mismatch"));
        }
        Ok(())
    }
}

pub fn digest(plaintext: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(plaintext).into()
}

pub fn checksum(plaintext: &[u8]) -> u32 {
    crc32fast::hash(plaintext)
}
