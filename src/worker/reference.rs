//! Reference resolution: swap `<field>_id` keys for the rows they name.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, PrimaryKeyTrait};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use crate::errors::{Error, OptionExt, Result};
use crate::schema::{FieldMap, FieldType, Schema};

/// Loads one referenced row by id and returns its serialized form.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ReferenceLoader: Send + Sync {
    async fn load(&self, db: &DatabaseConnection, id: &Value) -> Result<Value>;
}

/// [`ReferenceLoader`] fetching a SeaORM entity by primary key.
pub struct EntityLoader<E> {
    entity: PhantomData<E>,
}

impl<E> EntityLoader<E> {
    pub fn new() -> Self {
        Self {
            entity: PhantomData,
        }
    }
}

impl<E> Default for EntityLoader<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E> ReferenceLoader for EntityLoader<E>
where
    E: EntityTrait,
    E::Model: Serialize + Send + Sync,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: DeserializeOwned + Send,
{
    async fn load(&self, db: &DatabaseConnection, id: &Value) -> Result<Value> {
        let key: <E::PrimaryKey as PrimaryKeyTrait>::ValueType =
            serde_json::from_value(id.clone()).map_err(|_| {
                Error::schema(format!("reference id `{id}` does not match the target key type"))
            })?;

        let model = E::find_by_id(key).one(db).await?.ok_or_not_found()?;
        Ok(serde_json::to_value(model)?)
    }
}

/// Registry mapping reference field names to their loaders.
#[derive(Default, Clone)]
pub struct ReferenceLoaders {
    loaders: HashMap<String, Arc<dyn ReferenceLoader>>,
}

impl ReferenceLoaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loader for a reference field.
    pub fn with(mut self, field: impl Into<String>, loader: Arc<dyn ReferenceLoader>) -> Self {
        self.loaders.insert(field.into(), loader);
        self
    }

    /// Register an [`EntityLoader`] for a reference field.
    pub fn with_entity<E>(self, field: impl Into<String>) -> Self
    where
        E: EntityTrait,
        EntityLoader<E>: ReferenceLoader,
    {
        self.with(field, Arc::new(EntityLoader::<E>::new()))
    }

    fn get(&self, field: &str) -> Option<&dyn ReferenceLoader> {
        self.loaders.get(field).map(Arc::as_ref)
    }
}

/// Fill in referenced objects for id-bearing input.
///
/// For every `Reference` field `k` the schema declares that is absent from
/// `input` while `k_id` is present, the referenced row is loaded and its
/// serialized form inserted under `k`. The `k_id` key is then dropped
/// unless the schema declares it too. With `allow_null_id`, a null or
/// empty-string id resolves to an explicit null instead of a lookup.
pub async fn resolve_references(
    db: &DatabaseConnection,
    schema: &Schema,
    loaders: &ReferenceLoaders,
    input: &FieldMap,
    allow_null_id: bool,
) -> Result<FieldMap> {
    let mut output = input.clone();

    for (name, field) in schema.iter() {
        let FieldType::Reference { target } = field.ty() else {
            continue;
        };
        if output.contains_key(name) {
            continue;
        }

        let id_key = format!("{name}_id");
        let Some(id_value) = output.get(&id_key).cloned() else {
            continue;
        };

        let empty_id = id_value.is_null() || id_value.as_str().is_some_and(str::is_empty);
        let resolved = if empty_id && allow_null_id {
            Value::Null
        } else {
            let loader = loaders.get(name).ok_or_else(|| {
                Error::schema(format!("no reference loader registered for `{name}` ({target})"))
            })?;
            loader.load(db, &id_value).await?
        };

        output.insert(name.clone(), resolved);
        if !schema.contains(&id_key) {
            output.remove(&id_key);
        }
    }

    Ok(output)
}
