//! Field rules: declared types, coercions and per-value checks.

use serde_json::{Number, Value};
use validator::ValidateEmail;

use super::error::FieldError;

/// Declared type of a schema field, with its coercion behavior.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Plain string
    Text,
    /// Integer, accepted from a number or a numeric string.
    ///
    /// With `cast: false` the value is checked but left untouched.
    /// With `empty_to_none: true` an empty string becomes null.
    Integer { cast: bool, empty_to_none: bool },
    /// Float, with the same coercion knobs as [`FieldType::Integer`]
    Float { cast: bool, empty_to_none: bool },
    Boolean,
    /// UUID, coerced to its canonical hyphenated form
    Uuid,
    /// RFC 3339 timestamp, checked but left untouched
    DateTime,
    /// Email address, optionally lowercased
    Email { lowercase: bool },
    /// One of a fixed set of string values
    Choice(Vec<String>),
    /// A reference to another managed row, held as its serialized form.
    ///
    /// Reference fields are filled in by reference resolution; `target`
    /// names the referenced entity for diagnostics.
    Reference { target: String },
    /// Any JSON value, passed through untouched
    Json,
}

impl FieldType {
    /// Casting integer rule
    pub fn integer() -> Self {
        FieldType::Integer {
            cast: true,
            empty_to_none: false,
        }
    }

    /// Casting float rule
    pub fn float() -> Self {
        FieldType::Float {
            cast: true,
            empty_to_none: false,
        }
    }

    /// Email rule preserving case
    pub fn email() -> Self {
        FieldType::Email { lowercase: false }
    }

    pub fn choice<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldType::Choice(values.into_iter().map(Into::into).collect())
    }

    pub fn reference(target: impl Into<String>) -> Self {
        FieldType::Reference {
            target: target.into(),
        }
    }

    /// Check a non-null value against this rule, returning the coerced value.
    pub(crate) fn check(&self, field: &str, value: &Value) -> Result<Value, FieldError> {
        match self {
            FieldType::Text => match value.as_str() {
                Some(_) => Ok(value.clone()),
                None => Err(FieldError::new(field, "text", "expected a string")),
            },
            FieldType::Integer { cast, empty_to_none } => {
                check_integer(field, value, *cast, *empty_to_none)
            }
            FieldType::Float { cast, empty_to_none } => {
                check_float(field, value, *cast, *empty_to_none)
            }
            FieldType::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                _ => Err(FieldError::new(field, "boolean", "expected a boolean")),
            },
            FieldType::Uuid => match value.as_str().and_then(|s| uuid::Uuid::parse_str(s).ok()) {
                Some(parsed) => Ok(Value::String(parsed.to_string())),
                None => Err(FieldError::new(field, "uuid", "expected a UUID")),
            },
            FieldType::DateTime => match value.as_str() {
                Some(s) if chrono::DateTime::parse_from_rfc3339(s).is_ok() => Ok(value.clone()),
                _ => Err(FieldError::new(
                    field,
                    "datetime",
                    "expected an RFC 3339 timestamp",
                )),
            },
            FieldType::Email { lowercase } => match value.as_str() {
                Some(s) if s.validate_email() => {
                    if *lowercase {
                        Ok(Value::String(s.to_lowercase()))
                    } else {
                        Ok(value.clone())
                    }
                }
                Some(s) => Err(FieldError::new(
                    field,
                    "email",
                    format!("`{s}` is not a valid email address"),
                )),
                None => Err(FieldError::new(field, "email", "expected a string")),
            },
            FieldType::Choice(allowed) => match value.as_str() {
                Some(s) if allowed.iter().any(|a| a == s) => Ok(value.clone()),
                Some(s) => Err(FieldError::new(
                    field,
                    "choice",
                    format!("`{s}` is not one of the allowed values"),
                )),
                None => Err(FieldError::new(field, "choice", "expected a string")),
            },
            FieldType::Reference { target } => match value {
                Value::Object(_) => Ok(value.clone()),
                _ => Err(FieldError::new(
                    field,
                    "reference",
                    format!("expected a resolved `{target}` object"),
                )),
            },
            FieldType::Json => Ok(value.clone()),
        }
    }
}

fn check_integer(
    field: &str,
    value: &Value,
    cast: bool,
    empty_to_none: bool,
) -> Result<Value, FieldError> {
    match value {
        Value::String(s) => {
            if s.is_empty() && empty_to_none {
                return Ok(Value::Null);
            }
            match s.parse::<i64>() {
                Ok(n) if cast => Ok(Value::from(n)),
                Ok(_) => Ok(value.clone()),
                Err(_) => Err(FieldError::new(
                    field,
                    "integer",
                    format!("`{s}` is not an integer"),
                )),
            }
        }
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        _ => Err(FieldError::new(field, "integer", "expected an integer")),
    }
}

fn check_float(
    field: &str,
    value: &Value,
    cast: bool,
    empty_to_none: bool,
) -> Result<Value, FieldError> {
    match value {
        Value::String(s) => {
            if s.is_empty() && empty_to_none {
                return Ok(Value::Null);
            }
            match s.parse::<f64>() {
                Ok(f) if cast => Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| FieldError::new(field, "float", "expected a finite number")),
                Ok(_) => Ok(value.clone()),
                Err(_) => Err(FieldError::new(
                    field,
                    "float",
                    format!("`{s}` is not a number"),
                )),
            }
        }
        Value::Number(n) => {
            if cast {
                // Normalize to the float representation so equality
                // against serialized model values holds.
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| FieldError::new(field, "float", "expected a finite number"))
            } else {
                Ok(value.clone())
            }
        }
        _ => Err(FieldError::new(field, "float", "expected a number")),
    }
}

/// Rule for one named schema field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    ty: FieldType,
    required: bool,
    nullable: bool,
}

impl Field {
    pub(crate) fn new(ty: FieldType, required: bool) -> Self {
        Self {
            ty,
            required,
            // Null is an accepted value unless a field is marked not-null.
            nullable: true,
        }
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub(crate) fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    pub(crate) fn set_nullable(&mut self, nullable: bool) {
        self.nullable = nullable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_accepts_plain_addresses() {
        let ty = FieldType::email();
        assert!(ty.check("mail", &json!("a@b.cc")).is_ok());
        assert!(ty.check("mail", &json!("a+d@b.cc")).is_ok());
    }

    #[test]
    fn email_keeps_case_unless_lowercased() {
        let keep = FieldType::email();
        let lower = FieldType::Email { lowercase: true };

        assert_eq!(keep.check("mail", &json!("aZ@b.cc")).unwrap(), json!("aZ@b.cc"));
        assert_eq!(lower.check("mail", &json!("aZ@b.cc")).unwrap(), json!("az@b.cc"));
    }

    #[test]
    fn email_rejects_spaces() {
        let ty = FieldType::email();
        let err = ty.check("mail", &json!("a a@b.c")).unwrap_err();
        assert_eq!(err.code, "email");
    }

    #[test]
    fn float_casts_numeric_strings() {
        let ty = FieldType::float();
        assert_eq!(ty.check("value", &json!("1.12")).unwrap(), json!(1.12));
        assert_eq!(ty.check("value", &json!(1.12)).unwrap(), json!(1.12));
    }

    #[test]
    fn float_maps_empty_to_null_when_asked() {
        let ty = FieldType::Float {
            cast: true,
            empty_to_none: true,
        };
        assert_eq!(ty.check("value", &json!("")).unwrap(), Value::Null);
    }

    #[test]
    fn float_uncast_keeps_the_string() {
        let ty = FieldType::Float {
            cast: false,
            empty_to_none: false,
        };
        assert_eq!(ty.check("value", &json!("3.0")).unwrap(), json!("3.0"));
    }

    #[test]
    fn float_rejects_garbage() {
        let ty = FieldType::float();
        assert!(ty.check("value", &json!("3.a")).is_err());
    }

    #[test]
    fn integer_casts_numeric_strings() {
        let ty = FieldType::integer();
        assert_eq!(ty.check("count", &json!("1")).unwrap(), json!(1));
    }

    #[test]
    fn integer_maps_empty_to_null_when_asked() {
        let ty = FieldType::Integer {
            cast: true,
            empty_to_none: true,
        };
        assert_eq!(ty.check("count", &json!("")).unwrap(), Value::Null);
    }

    #[test]
    fn integer_uncast_keeps_the_string() {
        let ty = FieldType::Integer {
            cast: false,
            empty_to_none: false,
        };
        assert_eq!(ty.check("count", &json!("3")).unwrap(), json!("3"));
    }

    #[test]
    fn integer_rejects_floats() {
        let ty = FieldType::integer();
        assert!(ty.check("count", &json!("a")).is_err());
        assert!(ty.check("count", &json!("3.2")).is_err());
        assert!(ty.check("count", &json!(3.2)).is_err());
    }

    #[test]
    fn choice_only_accepts_listed_values() {
        let ty = FieldType::choice(["a", "b"]);
        assert!(ty.check("kind", &json!("a")).is_ok());
        assert!(ty.check("kind", &json!("c")).is_err());
    }

    #[test]
    fn uuid_is_canonicalized() {
        let ty = FieldType::Uuid;
        let coerced = ty
            .check("id", &json!("550E8400-E29B-41D4-A716-446655440000"))
            .unwrap();
        assert_eq!(coerced, json!("550e8400-e29b-41d4-a716-446655440000"));
    }
}
