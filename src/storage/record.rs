// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Vehicle record model: field constraints and the fixed-width byte layout.
//!
//! ## Binary Layout (195 bytes)
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       30    wi_fi            (network name, NUL padded)
//! 30      30    password         (network passphrase, NUL padded)
//! 60      18    vin
//! 78      10    license_plate
//! 88      20    brand
//! 108     20    model
//! 128     4     year             (i32 LE)
//! 132     1     transmission     (first byte of the code)
//! 133     20    body_type
//! 153     10    body_number
//! 163     4     engine_volume    (f32 LE)
//! 167     4     engine_power     (i32 LE)
//! 171     4     engine_type
//! 175     20    color
//! ```
//!
//! Each text field reserves one byte for the NUL terminator, so a field of
//! capacity `N` holds at most `N - 1` bytes of UTF-8.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::{StoreError, StoreResult};
use crate::credentials::NetworkCredentials;

pub const NETWORK_NAME_CAPACITY: usize = 30;
pub const NETWORK_PASSPHRASE_CAPACITY: usize = 30;
pub const VIN_CAPACITY: usize = 18;
pub const LICENSE_PLATE_CAPACITY: usize = 10;
pub const MAKE_CAPACITY: usize = 20;
pub const MODEL_CAPACITY: usize = 20;
pub const BODY_TYPE_CAPACITY: usize = 20;
pub const BODY_NUMBER_CAPACITY: usize = 10;
pub const ENGINE_TYPE_CAPACITY: usize = 4;
pub const COLOR_CAPACITY: usize = 20;

/// Serialized size of a [`VehicleRecord`].
pub const RECORD_SIZE: usize = NETWORK_NAME_CAPACITY
    + NETWORK_PASSPHRASE_CAPACITY
    + VIN_CAPACITY
    + LICENSE_PLATE_CAPACITY
    + MAKE_CAPACITY
    + MODEL_CAPACITY
    + 4
    + 1
    + BODY_TYPE_CAPACITY
    + BODY_NUMBER_CAPACITY
    + 4
    + 4
    + ENGINE_TYPE_CAPACITY
    + COLOR_CAPACITY;

pub const MIN_YEAR: i64 = 1886;
pub const MAX_YEAR: i64 = 2024;

/// Stored when the caller supplies no transmission.
pub const TRANSMISSION_UNSET: u8 = b' ';

/// 17 characters, excluding I, O and Q.
static VIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").expect("VIN pattern is a valid regex")
});

/// Raw vehicle fields as supplied by a caller at create time.
///
/// Every field is optional here so that absence can be reported as a
/// validation error naming the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct VehicleInput {
    /// Vehicle identification number (17 chars, no I/O/Q).
    pub vin: Option<String>,
    /// Registration plate (max 9 bytes).
    pub license_plate: Option<String>,
    /// Manufacturer (max 19 bytes).
    #[serde(rename = "brand")]
    pub make: Option<String>,
    /// Model name (max 19 bytes).
    pub model: Option<String>,
    /// Production year, 1886..=2024.
    pub year: Option<i64>,
    /// Transmission code; only the first character is kept.
    pub transmission: Option<String>,
    /// Body style (max 19 bytes).
    pub body_type: Option<String>,
    /// Body/frame serial (max 9 bytes).
    pub body_number: Option<String>,
    /// Engine displacement, non-negative.
    pub engine_volume: Option<f64>,
    /// Engine power, non-negative.
    pub engine_power: Option<i64>,
    /// Engine family code (max 3 bytes).
    pub engine_type: Option<String>,
    /// Color (max 19 bytes).
    pub color: Option<String>,
}

/// The single vehicle configuration entry.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRecord {
    pub network_name: String,
    pub network_passphrase: String,
    pub vin: String,
    pub license_plate: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    /// First byte of the supplied transmission string.
    pub transmission: u8,
    pub body_type: String,
    pub body_number: String,
    pub engine_volume: f32,
    pub engine_power: i32,
    pub engine_type: String,
    pub color: String,
}

impl VehicleRecord {
    /// Build a record from caller input and the device network credentials.
    pub fn validate(input: &VehicleInput, credentials: &NetworkCredentials) -> StoreResult<Self> {
        let network_name = text_field("wi_fi", &credentials.ssid, NETWORK_NAME_CAPACITY)?;
        let network_passphrase = text_field(
            "password",
            &credentials.passphrase,
            NETWORK_PASSPHRASE_CAPACITY,
        )?;

        let vin = text_field("vin", required("vin", &input.vin)?, VIN_CAPACITY)?;
        validate_vin(&vin)?;

        let record = Self {
            network_name,
            network_passphrase,
            vin,
            license_plate: text_field(
                "license_plate",
                required("license_plate", &input.license_plate)?,
                LICENSE_PLATE_CAPACITY,
            )?,
            make: text_field("brand", required("brand", &input.make)?, MAKE_CAPACITY)?,
            model: text_field("model", required("model", &input.model)?, MODEL_CAPACITY)?,
            body_type: text_field(
                "body_type",
                required("body_type", &input.body_type)?,
                BODY_TYPE_CAPACITY,
            )?,
            body_number: text_field(
                "body_number",
                required("body_number", &input.body_number)?,
                BODY_NUMBER_CAPACITY,
            )?,
            engine_type: text_field(
                "engine_type",
                required("engine_type", &input.engine_type)?,
                ENGINE_TYPE_CAPACITY,
            )?,
            color: text_field("color", required("color", &input.color)?, COLOR_CAPACITY)?,
            year: validate_year(input.year.ok_or_else(|| missing("year"))?)?,
            transmission: transmission_code(input.transmission.as_deref().unwrap_or(""))
                .unwrap_or(TRANSMISSION_UNSET),
            engine_volume: engine_volume(input.engine_volume.unwrap_or(0.0))?,
            engine_power: engine_power(input.engine_power.unwrap_or(0))?,
        };

        Ok(record)
    }

    /// Re-check every field constraint on an already built record.
    pub fn check(&self) -> StoreResult<()> {
        let text_fields = [
            ("wi_fi", &self.network_name, NETWORK_NAME_CAPACITY),
            ("password", &self.network_passphrase, NETWORK_PASSPHRASE_CAPACITY),
            ("vin", &self.vin, VIN_CAPACITY),
            ("license_plate", &self.license_plate, LICENSE_PLATE_CAPACITY),
            ("brand", &self.make, MAKE_CAPACITY),
            ("model", &self.model, MODEL_CAPACITY),
            ("body_type", &self.body_type, BODY_TYPE_CAPACITY),
            ("body_number", &self.body_number, BODY_NUMBER_CAPACITY),
            ("engine_type", &self.engine_type, ENGINE_TYPE_CAPACITY),
            ("color", &self.color, COLOR_CAPACITY),
        ];
        for (name, value, capacity) in text_fields {
            text_field(name, value, capacity)?;
        }

        validate_vin(&self.vin)?;
        validate_year(i64::from(self.year))?;
        engine_volume(f64::from(self.engine_volume))?;
        engine_power(i64::from(self.engine_power))?;
        Ok(())
    }

    /// Serialize to the fixed-width layout.
    ///
    /// Fails only if a field was mutated past its constraints after
    /// validation.
    pub fn to_bytes(&self) -> StoreResult<[u8; RECORD_SIZE]> {
        self.check()?;

        let mut out = LayoutWriter::new();
        out.text(&self.network_name, NETWORK_NAME_CAPACITY);
        out.text(&self.network_passphrase, NETWORK_PASSPHRASE_CAPACITY);
        out.text(&self.vin, VIN_CAPACITY);
        out.text(&self.license_plate, LICENSE_PLATE_CAPACITY);
        out.text(&self.make, MAKE_CAPACITY);
        out.text(&self.model, MODEL_CAPACITY);
        out.bytes(&self.year.to_le_bytes());
        out.bytes(&[self.transmission]);
        out.text(&self.body_type, BODY_TYPE_CAPACITY);
        out.text(&self.body_number, BODY_NUMBER_CAPACITY);
        out.bytes(&self.engine_volume.to_le_bytes());
        out.bytes(&self.engine_power.to_le_bytes());
        out.text(&self.engine_type, ENGINE_TYPE_CAPACITY);
        out.text(&self.color, COLOR_CAPACITY);
        Ok(out.finish())
    }

    /// Deserialize from the fixed-width layout.
    pub fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        if bytes.len() != RECORD_SIZE {
            return Err(StoreError::corruption(format!(
                "record is {} bytes, expected {RECORD_SIZE}",
                bytes.len()
            )));
        }

        let mut input = LayoutReader::new(bytes);
        let network_name = input.text("wi_fi", NETWORK_NAME_CAPACITY)?;
        let network_passphrase = input.text("password", NETWORK_PASSPHRASE_CAPACITY)?;
        let vin = input.text("vin", VIN_CAPACITY)?;
        let license_plate = input.text("license_plate", LICENSE_PLATE_CAPACITY)?;
        let make = input.text("brand", MAKE_CAPACITY)?;
        let model = input.text("model", MODEL_CAPACITY)?;
        let year = i32::from_le_bytes(input.array());
        let [transmission] = input.array::<1>();
        let body_type = input.text("body_type", BODY_TYPE_CAPACITY)?;
        let body_number = input.text("body_number", BODY_NUMBER_CAPACITY)?;
        let engine_volume = f32::from_le_bytes(input.array());
        let engine_power = i32::from_le_bytes(input.array());
        let engine_type = input.text("engine_type", ENGINE_TYPE_CAPACITY)?;
        let color = input.text("color", COLOR_CAPACITY)?;

        Ok(Self {
            network_name,
            network_passphrase,
            vin,
            license_plate,
            make,
            model,
            year,
            transmission,
            body_type,
            body_number,
            engine_volume,
            engine_power,
            engine_type,
            color,
        })
    }
}

// =============================================================================
// Field Rules
// =============================================================================

fn missing(field: &str) -> StoreError {
    StoreError::validation(format!("missing field: {field}"))
}

fn required<'a>(field: &str, value: &'a Option<String>) -> StoreResult<&'a str> {
    value.as_deref().ok_or_else(|| missing(field))
}

/// A text value must leave room for the NUL terminator and contain none.
pub(crate) fn text_field(field: &str, value: &str, capacity: usize) -> StoreResult<String> {
    if value.len() >= capacity {
        return Err(StoreError::validation(format!(
            "field {field} exceeds {} bytes",
            capacity - 1
        )));
    }
    if value.contains('\0') {
        return Err(StoreError::validation(format!(
            "field {field} contains a NUL character"
        )));
    }
    Ok(value.to_owned())
}

pub(crate) fn validate_vin(vin: &str) -> StoreResult<()> {
    if VIN_PATTERN.is_match(vin) {
        Ok(())
    } else {
        Err(StoreError::validation("invalid VIN format"))
    }
}

pub(crate) fn validate_year(year: i64) -> StoreResult<i32> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(StoreError::validation("invalid production year"));
    }
    i32::try_from(year).map_err(|_| StoreError::validation("invalid production year"))
}

/// First byte of `value`, or `None` when empty. Never rejected.
pub(crate) fn transmission_code(value: &str) -> Option<u8> {
    value.as_bytes().first().copied()
}

pub(crate) fn engine_volume(value: f64) -> StoreResult<f32> {
    // Sign is checked before narrowing: tiny negatives round to -0.0.
    // Narrowing can overflow to infinity, so finiteness is checked after.
    #[allow(clippy::cast_possible_truncation)]
    let narrowed = value as f32;
    if value < 0.0 || !narrowed.is_finite() {
        return Err(StoreError::validation("invalid engine volume"));
    }
    Ok(narrowed)
}

pub(crate) fn engine_power(value: i64) -> StoreResult<i32> {
    if value < 0 {
        return Err(StoreError::validation("invalid engine power"));
    }
    i32::try_from(value).map_err(|_| StoreError::validation("invalid engine power"))
}

// =============================================================================
// Layout Cursors
// =============================================================================

struct LayoutWriter {
    buf: [u8; RECORD_SIZE],
    pos: usize,
}

impl LayoutWriter {
    fn new() -> Self {
        Self {
            buf: [0u8; RECORD_SIZE],
            pos: 0,
        }
    }

    /// Caller guarantees `value.len() < capacity`; the rest stays zeroed.
    fn text(&mut self, value: &str, capacity: usize) {
        let bytes = value.as_bytes();
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += capacity;
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn finish(self) -> [u8; RECORD_SIZE] {
        debug_assert_eq!(self.pos, RECORD_SIZE);
        self.buf
    }
}

struct LayoutReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> LayoutReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> &'a [u8] {
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        slice
    }

    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N));
        out
    }

    fn text(&mut self, field: &str, capacity: usize) -> StoreResult<String> {
        let raw = self.take(capacity);
        let end = raw.iter().position(|&b| b == 0).ok_or_else(|| {
            StoreError::corruption(format!("field {field} is not NUL terminated"))
        })?;
        std::str::from_utf8(&raw[..end])
            .map(str::to_owned)
            .map_err(|_| StoreError::corruption(format!("field {field} is not valid UTF-8")))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_credentials() -> NetworkCredentials {
        NetworkCredentials::new("vehicle-ap", "correct horse battery")
    }

    pub(crate) fn sample_input() -> VehicleInput {
        VehicleInput {
            vin: Some("1HGCM82633A004352".into()),
            license_plate: Some("A123BC77".into()),
            make: Some("Honda".into()),
            model: Some("Accord".into()),
            year: Some(2003),
            transmission: Some("Automatic".into()),
            body_type: Some("Sedan".into()),
            body_number: Some("CM8263".into()),
            engine_volume: Some(2.4),
            engine_power: Some(160),
            engine_type: Some("K24".into()),
            color: Some("Silver".into()),
        }
    }

    pub(crate) fn sample_record() -> VehicleRecord {
        VehicleRecord::validate(&sample_input(), &sample_credentials()).unwrap()
    }

    fn validate(input: &VehicleInput) -> StoreResult<VehicleRecord> {
        VehicleRecord::validate(input, &sample_credentials())
    }

    #[test]
    fn record_size_matches_layout() {
        assert_eq!(RECORD_SIZE, 195);
    }

    #[test]
    fn valid_input_builds_record() {
        let record = sample_record();
        assert_eq!(record.network_name, "vehicle-ap");
        assert_eq!(record.network_passphrase, "correct horse battery");
        assert_eq!(record.vin, "1HGCM82633A004352");
        assert_eq!(record.make, "Honda");
        assert_eq!(record.year, 2003);
        assert_eq!(record.transmission, b'A');
        assert_eq!(record.engine_power, 160);
    }

    #[test]
    fn revalidating_a_valid_record_succeeds() {
        let record = sample_record();
        record.check().unwrap();
        record.check().unwrap();
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let mut input = sample_input();
        input.model = None;
        let err = validate(&input).unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref m) if m == "missing field: model"));

        let mut input = sample_input();
        input.year = None;
        assert!(matches!(validate(&input), Err(StoreError::Validation(_))));
    }

    #[test]
    fn vin_boundaries() {
        let mut input = sample_input();
        input.vin = Some("1HGCM82633A00435".into());
        assert!(matches!(validate(&input), Err(StoreError::Validation(_))));

        for bad in ["1HGCM82633A00435I", "1HGCM82633A00435O", "1HGCM82633A00435Q"] {
            input.vin = Some(bad.into());
            assert!(
                matches!(validate(&input), Err(StoreError::Validation(_))),
                "{bad} should be rejected"
            );
        }

        input.vin = Some("1hgcm82633a004352".into());
        assert!(matches!(validate(&input), Err(StoreError::Validation(_))));

        input.vin = Some("1HGCM82633A004352".into());
        assert!(validate(&input).is_ok());
    }

    #[test]
    fn year_boundaries() {
        let mut input = sample_input();
        for ok in [1886, 2024] {
            input.year = Some(ok);
            assert!(validate(&input).is_ok(), "{ok} should be accepted");
        }
        for bad in [1885, 2025] {
            input.year = Some(bad);
            assert!(
                matches!(validate(&input), Err(StoreError::Validation(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn text_must_leave_room_for_terminator() {
        let mut input = sample_input();
        input.license_plate = Some("123456789".into());
        assert!(validate(&input).is_ok());

        input.license_plate = Some("1234567890".into());
        assert!(matches!(validate(&input), Err(StoreError::Validation(_))));

        let mut input = sample_input();
        input.engine_type = Some("V8TT".into());
        assert!(matches!(validate(&input), Err(StoreError::Validation(_))));
    }

    #[test]
    fn embedded_nul_is_rejected() {
        let mut input = sample_input();
        input.color = Some("Red\0Blue".into());
        assert!(matches!(validate(&input), Err(StoreError::Validation(_))));
    }

    #[test]
    fn oversized_credentials_are_rejected() {
        let credentials = NetworkCredentials::new("x".repeat(30), "secret");
        let err = VehicleRecord::validate(&sample_input(), &credentials).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn transmission_defaults_to_space() {
        let mut input = sample_input();
        input.transmission = None;
        assert_eq!(validate(&input).unwrap().transmission, b' ');

        input.transmission = Some(String::new());
        assert_eq!(validate(&input).unwrap().transmission, b' ');

        input.transmission = Some("M".into());
        assert_eq!(validate(&input).unwrap().transmission, b'M');
    }

    #[test]
    fn non_ascii_transmission_keeps_first_byte() {
        let mut input = sample_input();
        input.transmission = Some("Автомат".into());
        let record = validate(&input).unwrap();
        assert_eq!(record.transmission, "Автомат".as_bytes()[0]);

        let bytes = record.to_bytes().unwrap();
        assert_eq!(bytes[132], 0xD0);
        assert_eq!(VehicleRecord::from_bytes(&bytes).unwrap(), record);
    }

    #[test]
    fn negative_volume_below_f32_precision_is_rejected() {
        let mut input = sample_input();
        input.engine_volume = Some(-1e-50);
        assert!(matches!(validate(&input), Err(StoreError::Validation(_))));

        input.engine_volume = Some(f64::NAN);
        assert!(matches!(validate(&input), Err(StoreError::Validation(_))));
    }

    #[test]
    fn engine_scalars_allow_zero_but_not_negative() {
        let mut input = sample_input();
        input.engine_volume = Some(0.0);
        input.engine_power = Some(0);
        assert!(validate(&input).is_ok());

        input.engine_volume = Some(-0.1);
        assert!(matches!(validate(&input), Err(StoreError::Validation(_))));

        input.engine_volume = Some(1.6);
        input.engine_power = Some(-1);
        assert!(matches!(validate(&input), Err(StoreError::Validation(_))));
    }

    #[test]
    fn optional_scalars_default_to_zero() {
        let mut input = sample_input();
        input.engine_volume = None;
        input.engine_power = None;
        let record = validate(&input).unwrap();
        assert_eq!(record.engine_volume, 0.0);
        assert_eq!(record.engine_power, 0);
    }

    #[test]
    fn serialization_round_trips() {
        let record = sample_record();
        let bytes = record.to_bytes().unwrap();
        assert_eq!(bytes.len(), RECORD_SIZE);
        assert_eq!(VehicleRecord::from_bytes(&bytes).unwrap(), record);
    }

    #[test]
    fn serialization_is_deterministic_and_padded() {
        let record = sample_record();
        let bytes = record.to_bytes().unwrap();
        assert_eq!(bytes, record.to_bytes().unwrap());

        assert_eq!(&bytes[0..10], b"vehicle-ap");
        assert!(bytes[10..30].iter().all(|&b| b == 0));
        assert_eq!(&bytes[60..77], b"1HGCM82633A004352");
        assert_eq!(bytes[77], 0);
        assert_eq!(&bytes[128..132], &2003i32.to_le_bytes());
        assert_eq!(bytes[132], b'A');
        assert_eq!(&bytes[167..171], &160i32.to_le_bytes());
    }

    #[test]
    fn mutated_record_fails_to_serialize() {
        let mut record = sample_record();
        record.color = "c".repeat(COLOR_CAPACITY);
        assert!(matches!(record.to_bytes(), Err(StoreError::Validation(_))));
    }

    #[test]
    fn from_bytes_rejects_wrong_size() {
        let err = VehicleRecord::from_bytes(&[0u8; RECORD_SIZE - 1]).unwrap_err();
        assert!(matches!(err, StoreError::Corruption(_)));
    }

    #[test]
    fn from_bytes_rejects_unterminated_field() {
        let mut bytes = sample_record().to_bytes().unwrap();
        bytes[171..175].copy_from_slice(b"ABCD");
        let err = VehicleRecord::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, StoreError::Corruption(_)));
    }

    #[test]
    fn input_uses_device_wire_names() {
        let input: VehicleInput = serde_json::from_value(serde_json::json!({
            "vin": "1HGCM82633A004352",
            "brand": "Honda",
            "year": 2003
        }))
        .unwrap();
        assert_eq!(input.make.as_deref(), Some("Honda"));
        assert_eq!(input.year, Some(2003));
        assert!(input.color.is_none());
    }
}
