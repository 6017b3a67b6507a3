// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Encrypted Vehicle Storage
//!
//! Holds exactly one vehicle record, encrypted at rest in a single file.
//!
//! ## Pipeline
//!
//! ```text
//! VehicleRecord --to_bytes--> 195-byte plaintext
//!     --PBKDF2 key + random IV--> AES-256-CBC ciphertext (208 bytes)
//!     --SHA-256 + CRC-32 of plaintext--> Envelope (260 bytes)
//!     --> {DATA_DIR}/car_detail.bin
//! ```
//!
//! Reads run the pipeline backwards and reject any envelope whose digest or
//! checksum does not match the decrypted plaintext.
//!
//! ## Security Model
//!
//! - The key is derived from the master secret and salt on every operation
//!   and never written anywhere
//! - A fresh IV is drawn for every write
//! - Digest and checksum detect corruption; they are not a MAC, and the
//!   envelope is not authenticated against a party who knows the key
//! - All operations are serialized through [`VehicleStore`]

pub mod cipher;
pub mod encrypted_fs;
pub mod envelope;
pub mod error;
pub mod integrity;
pub mod kdf;
pub mod patch;
pub mod paths;
pub mod record;
pub mod vault;

pub use envelope::Envelope;
pub use error::{StoreError, StoreResult};
pub use kdf::{KdfParams, Secrets};
pub use patch::{VehiclePatch, UPDATABLE_FIELDS};
pub use paths::StoragePaths;
pub use record::{VehicleInput, VehicleRecord};
pub use vault::VehicleStore;
