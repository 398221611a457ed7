//! Invocation parameter extraction.
//!
//! Pulls the recognized generation parameters out of an invocation
//! payload of the shape `{"input": {"params": {...}}}`. Every field is
//! optional; absent fields leave the workflow template defaults
//! untouched. Numeric fields are always coerced to integers, whether
//! the caller supplied them as JSON numbers or numeric strings.

use serde_json::Value;

use crate::error::JobError;

/// Request key for the generation width.
pub const FIELD_WIDTH: &str = "width";
/// Request key for the generation height.
pub const FIELD_HEIGHT: &str = "height";
/// Request key for the sampler seed.
pub const FIELD_SEED: &str = "tryon_seed";
/// Request key for the base64 human photo.
pub const FIELD_HUMAN_IMAGE: &str = "human_image";
/// Request key for the base64 tattoo design. The capitalized spelling
/// is part of the wire contract with existing callers.
pub const FIELD_TATTOO_IMAGE: &str = "Tattooimage";
/// Request key for the base64 placement mask.
pub const FIELD_MASK: &str = "mask";

/// Recognized generation parameters for one job.
///
/// `None` means the caller did not supply the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TryonParams {
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub tryon_seed: Option<i64>,
    pub human_image: Option<String>,
    pub tattoo_image: Option<String>,
    pub mask: Option<String>,
}

impl TryonParams {
    /// Extract parameters from a full invocation payload.
    ///
    /// Missing `input` or `params` levels yield an empty parameter set;
    /// a `params` value that is present but not an object is rejected.
    pub fn from_payload(payload: &Value) -> Result<Self, JobError> {
        let params = match payload.get("input").and_then(|input| input.get("params")) {
            None => return Ok(Self::default()),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(invalid("params", "must be an object".to_string()));
            }
        };

        Ok(Self {
            width: integer_field(params.get(FIELD_WIDTH), "width")?,
            height: integer_field(params.get(FIELD_HEIGHT), "height")?,
            tryon_seed: integer_field(params.get(FIELD_SEED), "tryon_seed")?,
            human_image: string_field(params.get(FIELD_HUMAN_IMAGE), "human_image")?,
            tattoo_image: string_field(params.get(FIELD_TATTOO_IMAGE), "Tattooimage")?,
            mask: string_field(params.get(FIELD_MASK), "mask")?,
        })
    }
}

fn invalid(field: &'static str, reason: String) -> JobError {
    JobError::InvalidParameter { field, reason }
}

/// Coerce an optional JSON value to an integer.
///
/// Accepts JSON integers, floats with a zero fractional part, and
/// numeric strings. Everything else is an [`JobError::InvalidParameter`].
fn integer_field(value: Option<&Value>, field: &'static str) -> Result<Option<i64>, JobError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Ok(Some(f as i64))
                } else {
                    Err(invalid(field, format!("'{f}' is not an integer")))
                }
            } else {
                Err(invalid(field, "out of integer range".to_string()))
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(field, format!("cannot parse '{s}' as an integer"))),
        other => Err(invalid(
            field,
            format!("expected an integer, got {other}"),
        )),
    }
}

/// Require an optional JSON value to be a string (base64 payload).
fn string_field(value: Option<&Value>, field: &'static str) -> Result<Option<String>, JobError> {
    match value {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(field, "expected a base64 string".to_string())),
    }
}
