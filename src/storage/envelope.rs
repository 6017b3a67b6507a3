// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stored envelope: the complete on-disk representation of the record.
//!
//! # Binary Layout
//!
//! ```text
//! Offset     Size  Field
//! ------     ----  -----
//! 0          16    iv
//! 16         N     ciphertext (AES-256-CBC, PKCS#7, N = len - 52)
//! 16 + N     32    SHA-256 of the plaintext record
//! 48 + N     4     CRC-32 of the plaintext record (u32 LE)
//! ```
//!
//! There is no magic or version field; the iteration count and layout must
//! stay fixed for the lifetime of a file.

use super::cipher::{self, IV_LEN};
use super::error::{StoreError, StoreResult};
use super::integrity::{IntegrityTag, CHECKSUM_LEN, DIGEST_LEN};
use super::kdf::DerivedKey;
use super::record::VehicleRecord;

/// Smallest byte count a well-formed envelope can have.
pub const MIN_ENVELOPE_LEN: usize = IV_LEN + DIGEST_LEN + CHECKSUM_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: IntegrityTag,
}

impl Envelope {
    /// Serialize, encrypt under a fresh IV and compute integrity values.
    pub fn seal(record: &VehicleRecord, key: &DerivedKey) -> StoreResult<Self> {
        let plaintext = record.to_bytes()?;
        let sealed = cipher::encrypt(&plaintext, key)?;
        Ok(Self {
            iv: sealed.iv,
            ciphertext: sealed.ciphertext,
            tag: IntegrityTag::compute(&plaintext),
        })
    }

    /// Decrypt, verify digest and checksum, then deserialize.
    pub fn open(&self, key: &DerivedKey) -> StoreResult<VehicleRecord> {
        let plaintext = cipher::decrypt(&self.ciphertext, &self.iv, key)?;
        self.tag.verify(&plaintext)?;
        VehicleRecord::from_bytes(&plaintext)
    }

    /// Total on-disk size.
    pub fn encoded_len(&self) -> usize {
        MIN_ENVELOPE_LEN + self.ciphertext.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag.digest);
        out.extend_from_slice(&self.tag.checksum.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        if bytes.len() < MIN_ENVELOPE_LEN {
            return Err(StoreError::corruption(format!(
                "Invalid file size: {} bytes, minimum {MIN_ENVELOPE_LEN}",
                bytes.len()
            )));
        }

        let (iv, rest) = bytes.split_at(IV_LEN);
        let (ciphertext, rest) = rest.split_at(rest.len() - DIGEST_LEN - CHECKSUM_LEN);
        let (digest, checksum) = rest.split_at(DIGEST_LEN);

        let mut iv_buf = [0u8; IV_LEN];
        iv_buf.copy_from_slice(iv);
        let mut digest_buf = [0u8; DIGEST_LEN];
        digest_buf.copy_from_slice(digest);
        let mut checksum_buf = [0u8; CHECKSUM_LEN];
        checksum_buf.copy_from_slice(checksum);

        Ok(Self {
            iv: iv_buf,
            ciphertext: ciphertext.to_vec(),
            tag: IntegrityTag {
                digest: digest_buf,
                checksum: u32::from_le_bytes(checksum_buf),
            },
        })
    }
}
