//! Shared fixtures for the integration tests.

#![allow(dead_code)]

pub mod entities;

use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Select};
use serde_json::json;

use seabed::{EntityWorker, FieldType, JsonSerializer, Schema, Supervised, Worker};

use self::entities::metric;

/// Business object owning the session.
pub struct Ledger {
    db: DatabaseConnection,
}

impl Ledger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl Worker for Ledger {
    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Worker managing metric rows; hides expired rows by default.
pub struct Metrics {
    base: Supervised<Ledger>,
}

impl Metrics {
    pub fn new(foreman: Arc<Ledger>) -> Self {
        Self {
            base: Supervised::new(foreman),
        }
    }

    pub fn foreman(&self) -> &Ledger {
        self.base.foreman()
    }
}

impl Worker for Metrics {
    fn db(&self) -> &DatabaseConnection {
        self.base.db()
    }
}

impl EntityWorker<metric::Entity> for Metrics {
    fn base_query(&self) -> Select<metric::Entity> {
        metric::Entity::find().filter(metric::Column::Expired.eq(false))
    }

    fn serializer(&self) -> JsonSerializer<metric::Model> {
        JsonSerializer::new().with("reading", |m: &metric::Model| {
            json!(format!("{}={}", m.key, m.value))
        })
    }
}

/// Update rules for metric rows.
pub fn metric_schema() -> Schema {
    Schema::builder()
        .required("key", FieldType::Text)
        .field("value", FieldType::float())
        .field("expired", FieldType::Boolean)
        .not_null(&["key", "expired"])
        .build()
}
