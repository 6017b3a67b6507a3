// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Vehicle Vault - Encrypted Single-Record Vehicle Store
//!
//! Keeps one vehicle's configuration encrypted at rest in a single file and
//! exposes create, read and whitelisted update over HTTP.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `config` - Environment configuration
//! - `credentials` - Device network credential provider
//! - `storage` - Record layout, key derivation, cipher, envelope file

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
