//! Argument validation against an [`OperationSchema`].
//!
//! Validation is a pure function over an untyped argument bundle:
//! - Fields are checked in declaration order and the first failure wins.
//! - `null` and empty optional strings count as absent; defaults fill absent fields.
//! - Bounds are inclusive and never clamped.
//! - Enumerations are matched exactly, case included.
//! - Unknown fields are dropped from the returned bundle.
//! - Preconditions run last, against the normalised bundle.

use std::fmt;

use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::schema::{FieldKind, FieldSchema, OperationSchema, Precondition};

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationReason {
    #[error("is required")]
    Missing,
    #[error("must not be empty")]
    Empty,
    #[error("must be {expected}, got {actual}")]
    WrongType { expected: &'static str, actual: &'static str },
    #[error("must be {bounds}, got {value}")]
    OutOfRange { value: String, bounds: String },
    #[error("must be one of [{}], got `{value}`", .allowed.join(", "))]
    NotAllowed { value: String, allowed: Vec<String> },
    #[error("must contain {bounds} items, got {count}")]
    Length { count: usize, bounds: String },
    #[error("requires {requirement} (missing {})", backticked(.missing))]
    Precondition { requirement: String, missing: Vec<String> },
}

/// A rejected argument bundle, naming the first offending field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub item: Option<usize>,
    pub reason: ValidationReason,
}

impl ValidationError {
    fn new(field: &str, reason: ValidationReason) -> Self {
        Self {
            field: field.to_string(),
            item: None,
            reason,
        }
    }

    fn at_item(mut self, index: usize) -> Self {
        self.item = Some(index);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.reason, self.item) {
            (ValidationReason::Precondition { .. }, _) => write!(f, "invalid arguments: {}", self.reason),
            (_, Some(index)) => write!(f, "invalid argument `{}` item {}: {}", self.field, index, self.reason),
            (_, None) => write!(f, "invalid argument `{}`: {}", self.field, self.reason),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate `arguments` against `schema` and return the normalised bundle.
///
/// The returned map contains only declared fields, with defaults applied and
/// integral numbers normalised to JSON integers.
pub fn validate_arguments(schema: &OperationSchema, arguments: &Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
    let mut validated = Map::new();

    for field in &schema.fields {
        let provided = arguments.get(field.name).filter(|value| !is_absent(value));
        match provided {
            Some(value) => {
                let normalized = validate_field(field, value)?;
                validated.insert(field.name.to_string(), normalized);
            }
            None => {
                if let Some(default) = field.default.as_ref() {
                    validated.insert(field.name.to_string(), default.clone());
                } else if field.required {
                    return Err(ValidationError::new(field.name, ValidationReason::Missing));
                }
            }
        }
    }

    for precondition in &schema.preconditions {
        check_precondition(precondition, &validated)?;
    }

    Ok(validated)
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn validate_field(field: &FieldSchema, value: &Value) -> Result<Value, ValidationError> {
    match field.kind {
        FieldKind::StringArray | FieldKind::IntegerArray => validate_array(field, value),
        _ => validate_scalar(field, field.kind, value),
    }
}

fn validate_array(field: &FieldSchema, value: &Value) -> Result<Value, ValidationError> {
    let Value::Array(items) = value else {
        return Err(ValidationError::new(
            field.name,
            ValidationReason::WrongType {
                expected: "array",
                actual: json_type_name(value),
            },
        ));
    };

    let count = items.len();
    let too_few = field.min_items.is_some_and(|min_items| count < min_items);
    let too_many = field.max_items.is_some_and(|max_items| count > max_items);
    if too_few || too_many {
        return Err(ValidationError::new(
            field.name,
            ValidationReason::Length {
                count,
                bounds: describe_item_bounds(field.min_items, field.max_items),
            },
        ));
    }

    let item_kind = match field.kind {
        FieldKind::IntegerArray => FieldKind::Integer,
        _ => FieldKind::String,
    };
    let mut normalized = Vec::with_capacity(count);
    for (index, item) in items.iter().enumerate() {
        if let Value::String(text) = item
            && text.trim().is_empty()
        {
            return Err(ValidationError::new(field.name, ValidationReason::Empty).at_item(index));
        }
        let value = validate_scalar(field, item_kind, item).map_err(|error| error.at_item(index))?;
        normalized.push(value);
    }
    Ok(Value::Array(normalized))
}

fn validate_scalar(field: &FieldSchema, kind: FieldKind, value: &Value) -> Result<Value, ValidationError> {
    let wrong_type = || {
        ValidationError::new(
            field.name,
            ValidationReason::WrongType {
                expected: kind.json_type(),
                actual: json_type_name(value),
            },
        )
    };

    match kind {
        FieldKind::String => {
            let Value::String(text) = value else {
                return Err(wrong_type());
            };
            if text.trim().is_empty() {
                return Err(ValidationError::new(field.name, ValidationReason::Empty));
            }
            if !field.allowed_values.is_empty() && !field.allowed_values.contains(&text.as_str()) {
                return Err(ValidationError::new(
                    field.name,
                    ValidationReason::NotAllowed {
                        value: text.clone(),
                        allowed: field.allowed_values.iter().map(ToString::to_string).collect(),
                    },
                ));
            }
            Ok(value.clone())
        }
        FieldKind::Integer => {
            match as_integral(value).ok_or_else(wrong_type)? {
                Integral::Fits(integer) => {
                    check_bounds(field, integer as f64, value)?;
                    Ok(Value::Number(Number::from(integer)))
                }
                Integral::Oversized(magnitude) => {
                    check_bounds(field, magnitude, value)?;
                    Err(ValidationError::new(
                        field.name,
                        ValidationReason::OutOfRange {
                            value: value.to_string(),
                            bounds: format!("between {} and {}", i64::MIN, i64::MAX),
                        },
                    ))
                }
            }
        }
        FieldKind::Number => {
            let number = value.as_f64().ok_or_else(wrong_type)?;
            check_bounds(field, number, value)?;
            Ok(value.clone())
        }
        FieldKind::Boolean => {
            if value.is_boolean() {
                Ok(value.clone())
            } else {
                Err(wrong_type())
            }
        }
        FieldKind::StringArray | FieldKind::IntegerArray => Err(wrong_type()),
    }
}

enum Integral {
    Fits(i64),
    /// Whole number outside the `i64` range, carried as `f64` for bounds reporting.
    Oversized(f64),
}

/// Integral JSON numbers only; `5.0` is accepted as `5`, `5.5` is not.
fn as_integral(value: &Value) -> Option<Integral> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(integer) = number.as_i64() {
        return Some(Integral::Fits(integer));
    }
    if let Some(unsigned) = number.as_u64() {
        return Some(Integral::Oversized(unsigned as f64));
    }
    let float = number.as_f64()?;
    if !float.is_finite() || float.fract() != 0.0 {
        return None;
    }
    // 2^63 is exactly representable and already past i64::MAX.
    if float >= i64::MIN as f64 && float < i64::MAX as f64 {
        Some(Integral::Fits(float as i64))
    } else {
        Some(Integral::Oversized(float))
    }
}

fn check_bounds(field: &FieldSchema, number: f64, original: &Value) -> Result<(), ValidationError> {
    let below = field.minimum.is_some_and(|minimum| number < minimum);
    let above = field.maximum.is_some_and(|maximum| number > maximum);
    if below || above {
        return Err(ValidationError::new(
            field.name,
            ValidationReason::OutOfRange {
                value: original.to_string(),
                bounds: describe_bounds(field.minimum, field.maximum),
            },
        ));
    }
    Ok(())
}

fn check_precondition(precondition: &Precondition, validated: &Map<String, Value>) -> Result<(), ValidationError> {
    match precondition {
        Precondition::AnyOf(groups) => {
            // Report against the alternative the caller got furthest with.
            let mut closest: Option<(usize, Vec<&str>)> = None;
            for group in groups {
                let missing = group
                    .iter()
                    .copied()
                    .filter(|field| !is_present(validated.get(*field)))
                    .collect::<Vec<&str>>();
                if missing.is_empty() {
                    return Ok(());
                }
                let supplied = group.len() - missing.len();
                let is_closer = closest.as_ref().is_none_or(|(best_supplied, best_missing)| {
                    supplied > *best_supplied || (supplied == *best_supplied && missing.len() < best_missing.len())
                });
                if is_closer {
                    closest = Some((supplied, missing));
                }
            }

            let missing = closest.map(|(_, missing)| missing).unwrap_or_default();
            let field = missing.first().copied().unwrap_or_default();
            Err(ValidationError::new(
                field,
                ValidationReason::Precondition {
                    requirement: precondition.describe(),
                    missing: missing.iter().map(ToString::to_string).collect(),
                },
            ))
        }
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

fn backticked(fields: &[String]) -> String {
    fields.iter().map(|field| format!("`{field}`")).collect::<Vec<String>>().join(", ")
}

fn describe_bounds(minimum: Option<f64>, maximum: Option<f64>) -> String {
    match (minimum, maximum) {
        (Some(minimum), Some(maximum)) => format!("between {minimum} and {maximum}"),
        (Some(minimum), None) => format!("at least {minimum}"),
        (None, Some(maximum)) => format!("at most {maximum}"),
        (None, None) => "any value".to_string(),
    }
}

fn describe_item_bounds(min_items: Option<usize>, max_items: Option<usize>) -> String {
    match (min_items, max_items) {
        (Some(min_items), Some(max_items)) => format!("between {min_items} and {max_items}"),
        (Some(min_items), None) => format!("at least {min_items}"),
        (None, Some(max_items)) => format!("at most {max_items}"),
        (None, None) => "any number of".to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
