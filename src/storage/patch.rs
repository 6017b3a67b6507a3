// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Partial updates to the stored record.
//!
//! Only the fields in [`UPDATABLE_FIELDS`] may change after creation. A
//! payload naming any other field is rejected before any value is looked at,
//! and every value is validated before any is applied.

use serde_json::{Map, Value};

use super::error::{StoreError, StoreResult};
use super::record::{
    engine_power, engine_volume, text_field, transmission_code, VehicleRecord,
    BODY_TYPE_CAPACITY, COLOR_CAPACITY, ENGINE_TYPE_CAPACITY, LICENSE_PLATE_CAPACITY,
};

/// Wire names of the fields an update may touch.
pub const UPDATABLE_FIELDS: [&str; 7] = [
    "license_plate",
    "transmission",
    "body_type",
    "engine_volume",
    "engine_power",
    "engine_type",
    "color",
];

/// Validated set of field changes. `None` leaves the stored value as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehiclePatch {
    pub license_plate: Option<String>,
    pub transmission: Option<u8>,
    pub body_type: Option<String>,
    pub engine_volume: Option<f32>,
    pub engine_power: Option<i32>,
    pub engine_type: Option<String>,
    pub color: Option<String>,
}

impl VehiclePatch {
    /// Parse an update payload keyed by wire field names.
    pub fn from_json(payload: &Map<String, Value>) -> StoreResult<Self> {
        if let Some(field) = payload
            .keys()
            .find(|key| !UPDATABLE_FIELDS.contains(&key.as_str()))
        {
            tracing::warn!(field = %field, "Rejected update of immutable field");
            return Err(StoreError::ForbiddenField(field.clone()));
        }

        let mut patch = Self::default();
        for (field, value) in payload {
            match field.as_str() {
                "license_plate" => {
                    patch.license_plate =
                        Some(text_field(field, as_str(field, value)?, LICENSE_PLATE_CAPACITY)?);
                }
                "transmission" => {
                    patch.transmission = transmission_code(as_str(field, value)?);
                }
                "body_type" => {
                    patch.body_type =
                        Some(text_field(field, as_str(field, value)?, BODY_TYPE_CAPACITY)?);
                }
                "engine_volume" => {
                    let volume = value
                        .as_f64()
                        .ok_or_else(|| wrong_type(field, "a number"))?;
                    let volume = engine_volume(volume)?;
                    if volume <= 0.0 {
                        return Err(StoreError::validation("invalid engine volume"));
                    }
                    patch.engine_volume = Some(volume);
                }
                "engine_power" => {
                    let power = value
                        .as_i64()
                        .ok_or_else(|| wrong_type(field, "an integer"))?;
                    patch.engine_power = Some(engine_power(power)?);
                }
                "engine_type" => {
                    patch.engine_type =
                        Some(text_field(field, as_str(field, value)?, ENGINE_TYPE_CAPACITY)?);
                }
                "color" => {
                    patch.color = Some(text_field(field, as_str(field, value)?, COLOR_CAPACITY)?);
                }
                other => return Err(StoreError::ForbiddenField(other.to_owned())),
            }
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the fields this patch carries.
    pub fn apply_to(&self, record: &mut VehicleRecord) {
        if let Some(plate) = &self.license_plate {
            record.license_plate.clone_from(plate);
        }
        if let Some(code) = self.transmission {
            record.transmission = code;
        }
        if let Some(body_type) = &self.body_type {
            record.body_type.clone_from(body_type);
        }
        if let Some(volume) = self.engine_volume {
            record.engine_volume = volume;
        }
        if let Some(power) = self.engine_power {
            record.engine_power = power;
        }
        if let Some(engine_type) = &self.engine_type {
            record.engine_type.clone_from(engine_type);
        }
        if let Some(color) = &self.color {
            record.color.clone_from(color);
        }
    }
}

fn as_str<'a>(field: &str, value: &'a Value) -> StoreResult<&'a str> {
    value.as_str().ok_or_else(|| wrong_type(field, "a string"))
}

fn wrong_type(field: &str, expected: &str) -> StoreError {
    StoreError::validation(format!("field {field} must be {expected}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::record::tests::sample_record;
    use serde_json::json;

    fn parse(value: Value) -> StoreResult<VehiclePatch> {
        match value {
            Value::Object(map) => VehiclePatch::from_json(&map),
            other => panic!("test payload must be an object, got {other}"),
        }
    }

    #[test]
    fn immutable_fields_are_forbidden() {
        for field in ["vin", "brand", "model", "year", "body_number", "wi_fi", "password"] {
            let mut payload = Map::new();
            payload.insert(field.to_owned(), json!("x"));
            let err = VehiclePatch::from_json(&payload).unwrap_err();
            assert!(
                matches!(err, StoreError::ForbiddenField(ref f) if f == field),
                "{field} was not rejected"
            );
        }
    }

    #[test]
    fn unknown_fields_are_forbidden() {
        let err = parse(json!({ "sunroof": true })).unwrap_err();
        assert!(matches!(err, StoreError::ForbiddenField(ref f) if f == "sunroof"));
    }

    #[test]
    fn forbidden_field_wins_over_invalid_value() {
        let err = parse(json!({ "color": 5, "vin": "X" })).unwrap_err();
        assert!(matches!(err, StoreError::ForbiddenField(_)));
    }

    #[test]
    fn all_whitelisted_fields_apply() {
        let patch = parse(json!({
            "license_plate": "B456CD99",
            "transmission": "Manual",
            "body_type": "Coupe",
            "engine_volume": 3.0,
            "engine_power": 240,
            "engine_type": "J30",
            "color": "Black",
        }))
        .unwrap();

        let mut record = sample_record();
        patch.apply_to(&mut record);

        assert_eq!(record.license_plate, "B456CD99");
        assert_eq!(record.transmission, b'M');
        assert_eq!(record.body_type, "Coupe");
        assert_eq!(record.engine_volume, 3.0);
        assert_eq!(record.engine_power, 240);
        assert_eq!(record.engine_type, "J30");
        assert_eq!(record.color, "Black");
        assert_eq!(record.vin, sample_record().vin);
    }

    #[test]
    fn empty_payload_changes_nothing() {
        let patch = parse(json!({})).unwrap();
        assert!(patch.is_empty());

        let mut record = sample_record();
        patch.apply_to(&mut record);
        assert_eq!(record, sample_record());
    }

    #[test]
    fn empty_transmission_keeps_stored_value() {
        let patch = parse(json!({ "transmission": "" })).unwrap();
        assert_eq!(patch.transmission, None);
    }

    #[test]
    fn non_ascii_transmission_is_accepted() {
        let patch = parse(json!({ "transmission": "Ärger" })).unwrap();
        assert_eq!(patch.transmission, Some(0xC3));

        let mut record = sample_record();
        patch.apply_to(&mut record);
        let bytes = record.to_bytes().unwrap();
        assert_eq!(VehicleRecord::from_bytes(&bytes).unwrap().transmission, 0xC3);
    }

    #[test]
    fn tiny_negative_engine_volume_is_rejected() {
        assert!(matches!(
            parse(json!({ "engine_volume": -1e-50 })),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn engine_volume_must_stay_positive() {
        assert!(matches!(
            parse(json!({ "engine_volume": 0.0 })),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            parse(json!({ "engine_volume": -1.5 })),
            Err(StoreError::Validation(_))
        ));
        assert_eq!(
            parse(json!({ "engine_volume": 1 })).unwrap().engine_volume,
            Some(1.0)
        );
    }

    #[test]
    fn engine_power_must_be_non_negative_integer() {
        assert_eq!(parse(json!({ "engine_power": 0 })).unwrap().engine_power, Some(0));
        assert!(matches!(
            parse(json!({ "engine_power": -1 })),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            parse(json!({ "engine_power": 150.5 })),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            parse(json!({ "engine_power": u64::MAX })),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn values_must_have_the_right_json_type() {
        for payload in [
            json!({ "color": 7 }),
            json!({ "license_plate": null }),
            json!({ "engine_volume": "2.0" }),
            json!({ "transmission": ["A"] }),
        ] {
            assert!(
                matches!(parse(payload.clone()), Err(StoreError::Validation(_))),
                "{payload} was accepted"
            );
        }
    }

    #[test]
    fn oversized_value_rejects_whole_patch() {
        let err = parse(json!({
            "color": "Red",
            "license_plate": "TOO-LONG-PLATE",
        }))
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
