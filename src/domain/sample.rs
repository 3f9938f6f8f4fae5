// Wind sample domain model and payload validation
use chrono::{DateTime, Local};
use serde_json::Value;
use thiserror::Error;

/// Payload text that could not be parsed as JSON.
#[derive(Debug, Error)]
#[error("payload is not valid JSON: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Decoded payload that does not describe a wind sample.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` is not a number")]
    NotNumeric(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// km/h
    pub speed: f64,
    /// degrees, 0-360 expected
    pub direction: f64,
}

impl Sample {
    pub fn new(speed: f64, direction: f64) -> Self {
        Self { speed, direction }
    }

    /// Accepts a decoded payload only when `speed` and `direction` are JSON numbers.
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationError> {
        let object = payload.as_object().ok_or(ValidationError::NotAnObject)?;
        let speed = numeric_field(object, "speed")?;
        let direction = numeric_field(object, "direction")?;
        Ok(Self::new(speed, direction))
    }
}

fn numeric_field(
    object: &serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<f64, ValidationError> {
    match object.get(name) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(name)),
        Some(Value::Number(n)) => n.as_f64().ok_or(ValidationError::NotNumeric(name)),
        Some(_) => Err(ValidationError::NotNumeric(name)),
    }
}

pub fn decode_payload(body: &str) -> Result<Value, DecodeError> {
    Ok(serde_json::from_str(body)?)
}

/// An accepted sample stamped with its local arrival time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReceivedSample {
    pub sample: Sample,
    pub received_at: DateTime<Local>,
}

impl ReceivedSample {
    pub fn new(sample: Sample, received_at: DateTime<Local>) -> Self {
        Self {
            sample,
            received_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_numeric_fields() {
        let sample = Sample::from_payload(&json!({"speed": 12.3, "direction": 47})).unwrap();
        assert_eq!(sample, Sample::new(12.3, 47.0));
    }

    #[test]
    fn test_ignores_extra_fields() {
        let payload = json!({"speed": 0, "direction": 359.5, "station": "north"});
        assert_eq!(Sample::from_payload(&payload).unwrap(), Sample::new(0.0, 359.5));
    }

    #[test]
    fn test_rejects_string_speed() {
        let err = Sample::from_payload(&json!({"speed": "x", "direction": 10})).unwrap_err();
        assert_eq!(err, ValidationError::NotNumeric("speed"));
    }

    #[test]
    fn test_rejects_numeric_string_direction() {
        let err = Sample::from_payload(&json!({"speed": 3.0, "direction": "10"})).unwrap_err();
        assert_eq!(err, ValidationError::NotNumeric("direction"));
    }

    #[test]
    fn test_rejects_missing_and_null_fields() {
        assert_eq!(
            Sample::from_payload(&json!({"direction": 10})).unwrap_err(),
            ValidationError::MissingField("speed")
        );
        assert_eq!(
            Sample::from_payload(&json!({"speed": 1, "direction": null})).unwrap_err(),
            ValidationError::MissingField("direction")
        );
    }

    #[test]
    fn test_rejects_non_object_payloads() {
        assert_eq!(
            Sample::from_payload(&json!([12.3, 47])).unwrap_err(),
            ValidationError::NotAnObject
        );
        assert_eq!(
            Sample::from_payload(&json!(42)).unwrap_err(),
            ValidationError::NotAnObject
        );
    }

    #[test]
    fn test_decode_payload() {
        assert!(decode_payload(r#"{"speed": 1, "direction": 2}"#).is_ok());
        assert!(decode_payload("speed=1").is_err());
        assert!(decode_payload("").is_err());
    }
}
