// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key derivation from the operator secrets.
//!
//! The envelope key is never stored. It is re-derived with PBKDF2-HMAC-SHA256
//! from the master key material and salt on every store operation, so the
//! same secrets and iteration count must be configured for the lifetime of
//! an envelope file.

use std::fmt;
use std::num::NonZeroU32;
use std::time::Instant;

use ring::pbkdf2;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Iteration count used when `PBKDF2_ITERATIONS` is not set.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// AES-256 key length.
pub const KEY_LEN: usize = 32;

/// Operator-provided master key material and salt.
///
/// Loaded once at startup, immutable afterwards, wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secrets {
    key: Vec<u8>,
    salt: Vec<u8>,
}

impl Secrets {
    pub fn new(key: impl Into<Vec<u8>>, salt: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            salt: salt.into(),
        }
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("key", &"[redacted]")
            .field("salt", &"[redacted]")
            .finish()
    }
}

/// A 256-bit symmetric key derived from [`Secrets`].
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([redacted])")
    }
}

/// Derivation parameters (currently only the iteration count).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: NonZeroU32,
}

impl KdfParams {
    pub fn new(iterations: NonZeroU32) -> Self {
        Self { iterations }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::new(NonZeroU32::new(DEFAULT_PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN))
    }
}

/// Derive the envelope key.
///
/// Deterministic: the same secrets and iteration count always produce the
/// same key. PBKDF2 with a non-zero iteration count and a 32-byte output
/// cannot fail, so no error path exists here.
pub fn derive_key(secrets: &Secrets, params: KdfParams) -> DerivedKey {
    let started = Instant::now();
    let mut key = [0u8; KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        params.iterations,
        &secrets.salt,
        &secrets.key,
        &mut key,
    );
    tracing::debug!(
        iterations = params.iterations(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Derived envelope key"
    );
    DerivedKey(key)
}
