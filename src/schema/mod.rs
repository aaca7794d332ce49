//! Schema-driven validation and coercion of field maps.
//!
//! A [`Schema`] declares, for each named field, its [`FieldType`] and
//! whether the field is required or may be null. Validating a JSON object
//! against a schema returns a coerced copy; the input is never mutated and
//! unknown keys are ignored.
//!
//! Schemas also know how to derive restricted or stricter variants of
//! themselves (`keep` / `without` / `make_required`), which keeps one
//! declaration usable across create and update flows.

mod error;
mod field;

pub use error::{FieldError, ValidationErrors};
pub use field::{Field, FieldType};

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{Error, Result};

/// A JSON object mapping field names to values.
pub type FieldMap = Map<String, Value>;

/// An ordered set of named field rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: BTreeMap<String, Field>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields.iter()
    }

    /// Derive a schema restricted to the given fields.
    pub fn keep(&self, names: &[&str]) -> Schema {
        Schema {
            fields: self
                .fields
                .iter()
                .filter(|(k, _)| names.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Derive a schema with the given fields removed.
    pub fn without(&self, names: &[&str]) -> Schema {
        Schema {
            fields: self
                .fields
                .iter()
                .filter(|(k, _)| !names.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Derive a schema where the given fields are required.
    pub fn make_required(&self, names: &[&str]) -> Schema {
        let mut fields = self.fields.clone();
        for (name, field) in &mut fields {
            if names.contains(&name.as_str()) {
                field.set_required(true);
            }
        }
        Schema { fields }
    }

    /// Validate a field map, returning the coerced copy.
    ///
    /// Required fields must be present, null is only accepted for nullable
    /// fields, and every present value is checked and coerced by its rule.
    /// Errors are collected across all fields rather than failing on the
    /// first one. Keys the schema does not declare are ignored.
    pub fn validate(&self, input: &FieldMap) -> std::result::Result<FieldMap, ValidationErrors> {
        let mut output = FieldMap::new();
        let mut errors = ValidationErrors::new();

        for (name, field) in &self.fields {
            match input.get(name) {
                None => {
                    if field.is_required() {
                        errors.push(FieldError::new(name, "required", "field is required"));
                    }
                }
                Some(Value::Null) => {
                    if field.is_nullable() {
                        output.insert(name.clone(), Value::Null);
                    } else {
                        errors.push(FieldError::new(name, "not_null", "field may not be null"));
                    }
                }
                Some(value) => match field.ty().check(name, value) {
                    Ok(coerced) => {
                        output.insert(name.clone(), coerced);
                    }
                    Err(e) => errors.push(e),
                },
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(errors)
        }
    }

    /// Project a model onto this schema's fields.
    ///
    /// Serializes the model and returns the sub-map of declared fields
    /// holding a non-null value. This is the "current state" side of a
    /// partial update.
    pub fn snapshot<M: Serialize>(&self, model: &M) -> Result<FieldMap> {
        let doc = serde_json::to_value(model)?;
        let Value::Object(doc) = doc else {
            return Err(Error::schema("model did not serialize to an object"));
        };

        Ok(self
            .fields
            .keys()
            .filter_map(|name| {
                doc.get(name)
                    .filter(|v| !v.is_null())
                    .map(|v| (name.clone(), v.clone()))
            })
            .collect())
    }
}

/// Builder for [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: BTreeMap<String, Field>,
}

impl SchemaBuilder {
    /// Declare an optional field.
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.insert(name.into(), Field::new(ty, false));
        self
    }

    /// Declare a required field.
    pub fn required(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.insert(name.into(), Field::new(ty, true));
        self
    }

    /// Mark previously declared fields as not accepting null.
    pub fn not_null(mut self, names: &[&str]) -> Self {
        for name in names {
            if let Some(field) = self.fields.get_mut(*name) {
                field.set_nullable(false);
            }
        }
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> Schema {
        Schema::builder()
            .required("id", FieldType::integer())
            .field("name", FieldType::Text)
            .field("value", FieldType::integer())
            .field("target", FieldType::integer())
            .build()
    }

    fn as_map(value: Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn keep_restricts_to_listed_fields() {
        let schema = sample_schema().keep(&["name"]);
        assert_eq!(schema.len(), 1);
        assert!(schema.contains("name"));
    }

    #[test]
    fn without_drops_listed_fields() {
        let schema = sample_schema().without(&["target"]);
        assert!(!schema.contains("target"));
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn make_required_only_touches_listed_fields() {
        let schema = sample_schema().make_required(&["name"]);
        assert!(schema.get("name").unwrap().is_required());
        assert!(!schema.get("value").unwrap().is_required());
    }

    #[test]
    fn nullable_fields_accept_null_by_default() {
        let schema = sample_schema();
        let data = as_map(json!({"id": 2, "name": "bla", "value": null}));

        let validated = schema.validate(&data).unwrap();
        assert_eq!(validated["value"], Value::Null);
        assert_eq!(validated["name"], json!("bla"));
    }

    #[test]
    fn not_null_fields_reject_null() {
        let schema = Schema::builder()
            .required("id", FieldType::integer())
            .field("name", FieldType::Text)
            .field("value", FieldType::integer())
            .not_null(&["name"])
            .build();
        let data = as_map(json!({"id": 2, "value": null, "name": null}));

        let errors = schema.validate(&data).unwrap_err();
        assert!(errors.contains("name"));
        assert!(!errors.contains("value"));
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let schema = sample_schema();
        let data = as_map(json!({"name": "bla"}));

        let errors = schema.validate(&data).unwrap_err();
        assert!(errors.contains("id"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let schema = sample_schema();
        let data = as_map(json!({"id": 2, "bogus": "anything"}));

        let validated = schema.validate(&data).unwrap();
        assert!(!validated.contains_key("bogus"));
    }

    #[test]
    fn errors_are_collected_across_fields() {
        let schema = sample_schema();
        let data = as_map(json!({"value": "x", "target": "y"}));

        let errors = schema.validate(&data).unwrap_err();
        assert_eq!(errors.len(), 3); // id missing, value and target invalid
    }

    #[test]
    fn snapshot_projects_non_null_schema_fields() {
        #[derive(Serialize)]
        struct Row {
            id: i64,
            name: Option<String>,
            value: i64,
            other: &'static str,
        }

        let schema = sample_schema();
        let row = Row {
            id: 7,
            name: None,
            value: 3,
            other: "ignored",
        };

        let snapshot = schema.snapshot(&row).unwrap();
        assert_eq!(snapshot, as_map(json!({"id": 7, "value": 3})));
    }
}
