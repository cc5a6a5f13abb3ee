//! Property validation service.
//!
//! Checks a JSON property payload against per-property rules (allowed
//! data types and cardinality). A pass answers 204 with no body, so the
//! pipeline payload is carried over unchanged; a failure answers 412 with
//! a short diagnostic.
//!
//! The payload is a JSON object mapping property names to values. If it
//! has a `properties` field holding an object, or a string containing a
//! JSON object, that inner object is validated instead. An array value is
//! a list of values; any other value counts as a single value. Properties
//! without rules are ignored.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use apix_types::config::{Cardinality, DataType, ValidationRule, ValidationServiceConfig};
use apix_types::request::StageResult;

/// Status answered when every rule passes.
pub const PASS_STATUS: u16 = 204;

/// Status answered when a rule fails or the payload cannot be read.
pub const FAIL_STATUS: u16 = 412;

/// Why a payload did not validate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// The payload is not a JSON property object.
    #[error("payload is not a property object: {0}")]
    InvalidPayload(String),

    /// A value has a data type the rule does not allow.
    #[error("property '{property}' has a {found} value, expected {expected}")]
    Datatype {
        /// Property name.
        property: String,
        /// Type of the offending value.
        found: DataType,
        /// Allowed types, comma separated.
        expected: String,
    },

    /// The number of values is outside the allowed bounds.
    #[error("property '{property}' has {count} values, allowed {bounds}")]
    Cardinality {
        /// Property name.
        property: String,
        /// Number of values found.
        count: usize,
        /// Human-readable bounds.
        bounds: String,
    },
}

/// Validates property payloads against configured rules.
#[derive(Debug, Clone, Default)]
pub struct ValidationService {
    rules: BTreeMap<String, ValidationRule>,
}

impl ValidationService {
    /// Create a service with the given rules.
    pub fn new(rules: BTreeMap<String, ValidationRule>) -> Self {
        Self { rules }
    }

    /// Create a service from its configuration section.
    pub fn from_config(config: &ValidationServiceConfig) -> Self {
        Self::new(config.rules.clone())
    }

    /// Number of configured rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Validate a payload.
    pub fn validate(&self, payload: &[u8]) -> Result<(), ValidationFailure> {
        let properties = extract_properties(payload)?;

        for (name, value) in &properties {
            let Some(rule) = self.rules.get(name) else {
                continue;
            };
            let values = values_of(value);
            if let Some(allowed) = &rule.datatype {
                check_datatype(name, &values, allowed)?;
            }
            if let Some(bounds) = &rule.cardinality {
                check_cardinality(name, values.len(), bounds)?;
            }
        }
        Ok(())
    }

    /// Validate a payload and answer with the stage contract.
    pub fn handle(&self, payload: &[u8]) -> StageResult {
        match self.validate(payload) {
            Ok(()) => {
                tracing::debug!(rules = self.rules.len(), "validation passed");
                StageResult::empty(PASS_STATUS)
            }
            Err(failure) => {
                tracing::info!(reason = %failure, "validation failed");
                StageResult::new(FAIL_STATUS, failure.to_string())
            }
        }
    }
}

fn extract_properties(payload: &[u8]) -> Result<Map<String, Value>, ValidationFailure> {
    let root: Value = serde_json::from_slice(payload)
        .map_err(|e| ValidationFailure::InvalidPayload(e.to_string()))?;
    let Value::Object(mut root) = root else {
        return Err(ValidationFailure::InvalidPayload(
            "expected a JSON object".into(),
        ));
    };

    match root.remove("properties") {
        None => Ok(root),
        Some(Value::Object(inner)) => Ok(inner),
        Some(Value::String(encoded)) => match serde_json::from_str(&encoded) {
            Ok(Value::Object(inner)) => Ok(inner),
            Ok(_) => Err(ValidationFailure::InvalidPayload(
                "'properties' does not encode a JSON object".into(),
            )),
            Err(e) => Err(ValidationFailure::InvalidPayload(format!(
                "'properties' is not valid JSON: {e}"
            ))),
        },
        Some(_) => Err(ValidationFailure::InvalidPayload(
            "'properties' must be an object or a JSON string".into(),
        )),
    }
}

fn values_of(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn data_type_of(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => DataType::Integer,
        Value::Number(_) => DataType::Double,
        Value::String(_) => DataType::String,
        Value::Array(_) => DataType::Array,
        Value::Object(_) => DataType::Object,
    }
}

fn check_datatype(
    property: &str,
    values: &[&Value],
    allowed: &[DataType],
) -> Result<(), ValidationFailure> {
    for value in values {
        let found = data_type_of(value);
        if !allowed.contains(&found) {
            let expected = allowed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ValidationFailure::Datatype {
                property: property.to_string(),
                found,
                expected,
            });
        }
    }
    Ok(())
}

fn check_cardinality(
    property: &str,
    count: usize,
    bounds: &Cardinality,
) -> Result<(), ValidationFailure> {
    let too_few = bounds.min.is_some_and(|min| count < min);
    let too_many = bounds.max.is_some_and(|max| count > max);
    if !(too_few || too_many) {
        return Ok(());
    }

    let bounds = match (bounds.min, bounds.max) {
        (Some(min), Some(max)) => format!("{min}..={max}"),
        (Some(min), None) => format!("at least {min}"),
        (None, Some(max)) => format!("at most {max}"),
        (None, None) => String::new(),
    };
    Err(ValidationFailure::Cardinality {
        property: property.to_string(),
        count,
        bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ValidationService {
        let config: ValidationServiceConfig = serde_json::from_str(
            r#"{
                "enabled": true,
                "rules": {
                    "title": {"datatype": ["string"], "cardinality": {"min": 1, "max": 1}},
                    "rank": {"datatype": ["integer", "double"]},
                    "tags": {"cardinality": {"max": 3}}
                }
            }"#,
        )
        .unwrap();
        ValidationService::from_config(&config)
    }

    #[test]
    fn valid_payload_passes_with_empty_body() {
        let svc = service();
        assert_eq!(svc.rule_count(), 3);
        let payload = br#"{"title": ["Water Lilies"], "rank": [1, 2.5], "tags": ["a", "b"], "other": null}"#;
        assert_eq!(svc.validate(payload), Ok(()));
        assert_eq!(svc.handle(payload), StageResult::empty(PASS_STATUS));
    }

    #[test]
    fn scalar_counts_as_one_value() {
        assert!(service().validate(br#"{"title": "Nocturne"}"#).is_ok());
    }

    #[test]
    fn wrong_datatype_fails() {
        let err = service()
            .validate(br#"{"rank": [1, "high"]}"#)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationFailure::Datatype {
                property: "rank".into(),
                found: DataType::String,
                expected: "integer, double".into(),
            }
        );
    }

    #[test]
    fn cardinality_bounds() {
        let svc = service();
        let err = svc.validate(br#"{"title": []}"#).unwrap_err();
        assert!(matches!(err, ValidationFailure::Cardinality { count: 0, .. }));

        let err = svc.validate(br#"{"tags": [1, 2, 3, 4]}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "property 'tags' has 4 values, allowed at most 3"
        );
    }

    #[test]
    fn properties_wrapper_is_unwrapped() {
        let svc = service();
        assert!(svc.validate(br#"{"properties": {"title": ["x"]}}"#).is_ok());
        assert!(svc
            .validate(br#"{"properties": "{\"title\": [\"x\"]}"}"#)
            .is_ok());
        assert!(svc
            .validate(br#"{"properties": "{\"title\": [1]}"}"#)
            .is_err());
    }

    #[test]
    fn unreadable_payload_answers_412() {
        let svc = service();
        let payloads: [&[u8]; 4] = [b"", b"not json", b"[1, 2]", br#"{"properties": 5}"#];
        for payload in payloads {
            let result = svc.handle(payload);
            assert_eq!(result.status, FAIL_STATUS);
            assert!(
                String::from_utf8_lossy(&result.body).starts_with("payload is not a property object"),
                "payload {:?}",
                String::from_utf8_lossy(payload)
            );
        }
    }

    #[test]
    fn no_rules_accepts_any_object() {
        let svc = ValidationService::default();
        assert!(svc.validate(br#"{"anything": [1, "two", null]}"#).is_ok());
    }
}
