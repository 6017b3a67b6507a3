// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Response and documentation types for the vehicle endpoints. Create input
//! is [`VehicleInput`](crate::storage::VehicleInput); update input is a raw
//! JSON object checked against the mutation whitelist.
//!
//! Field names on the wire follow the device's existing JSON API (`wi_fi`,
//! `brand`, ...), not the Rust field names.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::VehicleRecord;

/// Placeholder returned instead of the network passphrase.
pub const HIDDEN_PASSPHRASE: &str = "[hidden]";

/// Caller-visible rendering of the stored record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct VehicleView {
    /// Access point name of the device network.
    pub wi_fi: String,
    /// Always `"[hidden]"`.
    pub password: String,
    pub vin: String,
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    /// Transmission code (the stored byte as a single character).
    pub transmission: String,
    pub body_type: String,
    pub body_number: String,
    pub engine_volume: f32,
    pub engine_power: i32,
    pub engine_type: String,
    pub color: String,
}

impl From<&VehicleRecord> for VehicleView {
    fn from(record: &VehicleRecord) -> Self {
        Self {
            wi_fi: record.network_name.clone(),
            password: HIDDEN_PASSPHRASE.to_string(),
            vin: record.vin.clone(),
            license_plate: record.license_plate.clone(),
            brand: record.make.clone(),
            model: record.model.clone(),
            year: record.year,
            transmission: char::from(record.transmission).to_string(),
            body_type: record.body_type.clone(),
            body_number: record.body_number.clone(),
            engine_volume: record.engine_volume,
            engine_power: record.engine_power,
            engine_type: record.engine_type.clone(),
            color: record.color.clone(),
        }
    }
}

/// Fields accepted by `PATCH /car/update`. Any other key is rejected with 403.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct VehicleUpdate {
    pub license_plate: Option<String>,
    /// Empty string leaves the stored code unchanged.
    pub transmission: Option<String>,
    pub body_type: Option<String>,
    /// Must be greater than zero.
    pub engine_volume: Option<f64>,
    /// Must be zero or greater.
    pub engine_power: Option<i64>,
    pub engine_type: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}
