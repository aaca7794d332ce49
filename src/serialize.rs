//! Serialization helpers: turn models into plain JSON objects.

use serde::Serialize;
use serde_json::Value;

use crate::errors::{Error, Result};
use crate::schema::{FieldMap, Schema};

type ComputedFn<M> = Box<dyn Fn(&M) -> Value + Send + Sync>;

/// Turns models into easily serializable JSON objects.
///
/// The base projection is the whole serialized model, or only a schema's
/// fields; named computed entries are evaluated per item on top of it.
pub struct JsonSerializer<M> {
    fields: Option<Vec<String>>,
    computed: Vec<(String, ComputedFn<M>)>,
}

impl<M: Serialize> JsonSerializer<M> {
    /// Serializer emitting the whole model.
    pub fn new() -> Self {
        Self {
            fields: None,
            computed: Vec::new(),
        }
    }

    /// Serializer restricted to a schema's fields.
    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            fields: Some(schema.keys().cloned().collect()),
            computed: Vec::new(),
        }
    }

    /// Add a computed entry, evaluated per item.
    pub fn with(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&M) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.computed.push((name.into(), Box::new(f)));
        self
    }

    /// Transform one item into a JSON object.
    pub fn serialize_one(&self, item: &M) -> Result<FieldMap> {
        let doc = serde_json::to_value(item)?;
        let Value::Object(doc) = doc else {
            return Err(Error::schema("item did not serialize to an object"));
        };

        let mut out = match &self.fields {
            None => doc,
            Some(fields) => fields
                .iter()
                .filter_map(|name| doc.get(name).map(|v| (name.clone(), v.clone())))
                .collect(),
        };

        for (name, compute) in &self.computed {
            out.insert(name.clone(), compute(item));
        }

        Ok(out)
    }

    /// Transform a list of items into JSON objects.
    pub fn serialize(&self, items: &[M]) -> Result<Vec<FieldMap>> {
        items.iter().map(|item| self.serialize_one(item)).collect()
    }
}

impl<M: Serialize> Default for JsonSerializer<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use serde_json::json;

    #[derive(Serialize)]
    struct Row {
        id: i64,
        name: String,
        secret: String,
    }

    fn sample_row() -> Row {
        Row {
            id: 3,
            name: "pump".to_string(),
            secret: "hidden".to_string(),
        }
    }

    #[test]
    fn serializes_the_whole_model_by_default() {
        let serialized = JsonSerializer::new().serialize_one(&sample_row()).unwrap();
        assert_eq!(serialized["id"], json!(3));
        assert_eq!(serialized["secret"], json!("hidden"));
    }

    #[test]
    fn schema_projection_drops_undeclared_fields() {
        let schema = crate::schema::Schema::builder()
            .required("id", FieldType::integer())
            .field("name", FieldType::Text)
            .build();

        let serialized = JsonSerializer::from_schema(&schema)
            .serialize_one(&sample_row())
            .unwrap();
        assert_eq!(serialized.len(), 2);
        assert!(!serialized.contains_key("secret"));
    }

    #[test]
    fn computed_entries_are_added_per_item() {
        let serializer =
            JsonSerializer::new().with("label", |row: &Row| json!(format!("#{} {}", row.id, row.name)));

        let rows = vec![sample_row(), sample_row()];
        let serialized = serializer.serialize(&rows).unwrap();
        assert_eq!(serialized.len(), 2);
        assert_eq!(serialized[0]["label"], json!("#3 pump"));
    }
}
