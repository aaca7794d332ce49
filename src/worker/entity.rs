//! Entity workers: unified get / find / update over one mapped entity.

use std::str::FromStr;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    FromQueryResult, IntoActiveModel, Iterable, PaginatorTrait, PrimaryKeyToColumn,
    PrimaryKeyTrait, QueryFilter, Select,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::{Error, OptionExt, Result};
use crate::schema::{FieldMap, Schema};
use crate::serialize::JsonSerializer;
use crate::types::{Paginated, PaginationParams};
use crate::worker::base::Worker;
use crate::worker::reference::{resolve_references, ReferenceLoaders};

/// Criterion for a unified get: an already-fetched model or a key.
pub enum Lookup<E: EntityTrait> {
    Model(E::Model),
    Key(<E::PrimaryKey as PrimaryKeyTrait>::ValueType),
}

impl<E: EntityTrait> Lookup<E> {
    pub fn model(model: E::Model) -> Self {
        Lookup::Model(model)
    }

    pub fn key(key: impl Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>) -> Self {
        Lookup::Key(key.into())
    }
}

/// Outcome of a partial update.
#[derive(Debug, Clone, PartialEq)]
pub enum Updated<M> {
    /// At least one field differed; the row was written.
    Changed(M),
    /// The requested values matched the current state; nothing was written.
    Unchanged(M),
}

impl<M> Updated<M> {
    pub fn is_changed(&self) -> bool {
        matches!(self, Updated::Changed(_))
    }

    pub fn model(&self) -> &M {
        match self {
            Updated::Changed(m) | Updated::Unchanged(m) => m,
        }
    }

    pub fn into_model(self) -> M {
        match self {
            Updated::Changed(m) | Updated::Unchanged(m) => m,
        }
    }
}

/// Worker dedicated to one mapped entity.
///
/// Every operation runs against the worker's session and starts from
/// [`EntityWorker::base_query`], which implementations can override to
/// install ambient filters (hiding expired rows, tenant scoping, ...).
#[async_trait]
pub trait EntityWorker<E>: Worker
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
{
    /// Base query for this kind of object.
    fn base_query(&self) -> Select<E> {
        E::find()
    }

    /// A query to fetch multiple objects, for the caller to refine.
    fn find(&self) -> Select<E> {
        self.base_query()
    }

    /// Unified get for an object given by key or already at hand.
    async fn get(&self, target: Lookup<E>) -> Result<E::Model>
    where
        <E::PrimaryKey as PrimaryKeyTrait>::ValueType: Into<sea_orm::Value> + Send,
    {
        fetch_one(self.db(), self.base_query(), target).await
    }

    /// Fetch all objects matched by `find()`.
    async fn list(&self) -> Result<Vec<E::Model>> {
        self.find().all(self.db()).await.map_err(Into::into)
    }

    /// Fetch one page of the objects matched by `find()`.
    async fn list_paginated(&self, params: &PaginationParams) -> Result<Paginated<E::Model>> {
        let paginator = self.find().paginate(self.db(), params.limit());
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(params.page.saturating_sub(1)).await?;
        Ok(Paginated::new(data, params.page, params.limit(), total))
    }

    /// Schema-driven partial update; see [`apply_update`].
    async fn update<A>(
        &self,
        model: E::Model,
        schema: &Schema,
        changes: &FieldMap,
    ) -> Result<Updated<E::Model>>
    where
        E::Model: Serialize + DeserializeOwned + IntoActiveModel<A>,
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + 'static,
    {
        apply_update::<E, A, _>(self.db(), model, schema, changes).await
    }

    /// Serializer used by [`EntityWorker::serialize`].
    ///
    /// Emits the whole model by default; implementations override this to
    /// restrict fields or add computed entries.
    fn serializer(&self) -> JsonSerializer<E::Model>
    where
        E::Model: Serialize,
    {
        JsonSerializer::new()
    }

    /// Transform one item into an easily serializable JSON object.
    fn serialize_one(&self, item: &E::Model) -> Result<FieldMap>
    where
        E::Model: Serialize,
    {
        self.serializer().serialize_one(item)
    }

    /// Transform the given items into easily serializable JSON objects.
    fn serialize(&self, items: &[E::Model]) -> Result<Vec<FieldMap>>
    where
        E::Model: Serialize,
    {
        self.serializer().serialize(items)
    }

    /// Fill in referenced objects for id-bearing input; see
    /// [`resolve_references`].
    async fn resolve(
        &self,
        schema: &Schema,
        loaders: &ReferenceLoaders,
        input: &FieldMap,
        allow_null_id: bool,
    ) -> Result<FieldMap> {
        resolve_references(self.db(), schema, loaders, input, allow_null_id).await
    }
}

/// Fetch a single row through the given query, honoring an already-fetched
/// model.
///
/// Takes any [`ConnectionTrait`] so it composes with transactions.
pub async fn fetch_one<E, C>(db: &C, query: Select<E>, target: Lookup<E>) -> Result<E::Model>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: Into<sea_orm::Value> + Send,
    C: ConnectionTrait,
{
    match target {
        Lookup::Model(model) => Ok(model),
        Lookup::Key(key) => {
            let primary_key = {
                let mut key_columns = E::PrimaryKey::iter();
                let primary_key = key_columns
                    .next()
                    .ok_or_else(|| Error::schema("entity has no primary key"))?;
                if key_columns.next().is_some() {
                    return Err(Error::schema("composite primary keys are not supported"));
                }
                primary_key
            };

            query
                .filter(primary_key.into_column().eq(key))
                .one(db)
                .await?
                .ok_or_not_found()
        }
    }
}

/// Apply a schema-driven partial update to `model`.
///
/// The model's current values for the schema's fields are overlaid with the
/// requested `changes` (restricted to schema fields; anything else is
/// ignored), the merged map is validated and coerced, and only the touched
/// columns are written back. When the coerced result matches the current
/// state the row is left alone and [`Updated::Unchanged`] is returned.
///
/// Takes any [`ConnectionTrait`] so it composes with transactions.
pub async fn apply_update<E, A, C>(
    db: &C,
    model: E::Model,
    schema: &Schema,
    changes: &FieldMap,
) -> Result<Updated<E::Model>>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Serialize + DeserializeOwned + IntoActiveModel<A> + Send + Sync,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + 'static,
    C: ConnectionTrait,
{
    let current = schema.snapshot(&model)?;

    let touched: Vec<&str> = schema
        .keys()
        .filter(|k| changes.contains_key(k.as_str()))
        .map(String::as_str)
        .collect();

    let mut merged = current.clone();
    for key in &touched {
        merged.insert((*key).to_string(), changes[*key].clone());
    }

    let validated = schema.validate(&merged)?;

    // Null and absent both mean "no value": compare on that footing so a
    // null-to-null overwrite does not count as a change.
    let mut effective = validated.clone();
    effective.retain(|_, v| !v.is_null());
    if touched.is_empty() || effective == current {
        tracing::debug!("update matched current state, skipping write");
        return Ok(Updated::Unchanged(model));
    }

    let mut doc = serde_json::to_value(&model)?;
    let Some(fields) = doc.as_object_mut() else {
        return Err(Error::schema("model did not serialize to an object"));
    };
    for key in &touched {
        let value = validated.get(*key).cloned().unwrap_or(Value::Null);
        fields.insert((*key).to_string(), value);
    }

    let patched: E::Model = serde_json::from_value(doc)?;
    let mut active = patched.into_active_model();
    for key in &touched {
        let column = E::Column::from_str(key)
            .map_err(|_| Error::schema(format!("`{key}` is not a column of the managed entity")))?;
        active.reset(column);
    }

    let saved = active.update(db).await?;
    tracing::debug!(fields = touched.len(), "applied partial update");
    Ok(Updated::Changed(saved))
}
