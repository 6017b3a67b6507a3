// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy for the vehicle store.

use std::io;

use crate::credentials::CredentialError;

/// Error type for every vehicle store operation.
///
/// Each variant maps to one caller-visible kind (see [`StoreError::kind`]).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Bad input shape or range (client-caused).
    #[error("validation error: {0}")]
    Validation(String),

    /// Create against an existing record.
    #[error("vehicle record already exists")]
    AlreadyExists,

    /// Read/Update against a missing record.
    #[error("vehicle record not found")]
    NotFound,

    /// Digest or checksum mismatch, truncated envelope, bad decrypted size.
    #[error("store corruption: {0}")]
    Corruption(String),

    /// Update touching a field outside the mutation whitelist.
    #[error("modifying field {0} is prohibited")]
    ForbiddenField(String),

    /// Key derivation or cipher primitive failure.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The device network credentials could not be obtained.
    #[error("network credentials unavailable: {0}")]
    Credentials(#[from] CredentialError),

    /// Filesystem failure, with the step that failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Stable machine-readable code for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Validation(_) => "validation_error",
            StoreError::AlreadyExists => "already_exists",
            StoreError::NotFound => "not_found",
            StoreError::Corruption(_) => "corruption",
            StoreError::ForbiddenField(_) => "forbidden_field",
            StoreError::Crypto(_) => "crypto_error",
            StoreError::Credentials(_) => "credentials_error",
            StoreError::Io { .. } => "io_error",
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub(crate) fn corruption(message: impl Into<String>) -> Self {
        StoreError::Corruption(message.into())
    }

    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
