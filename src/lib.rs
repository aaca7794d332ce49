//! Seabed - foundation layer for schema-driven data-access workers.
//!
//! This crate provides the base building blocks an application mixes into
//! its business-object layer, wrapping an injected SeaORM session with
//! unified get / update / serialize helpers and a schema validation
//! library.
//!
//! # Architecture Layers
//!
//! - **worker**: worker roots and entity workers (unified get / find /
//!   update, reference resolution)
//! - **schema**: validation and coercion of field maps
//! - **serialize**: model-to-JSON helpers with computed entries
//! - **infra**: connection bootstrap and transactions
//! - **config**: database configuration and constants
//! - **types**: shared types (pagination)
//! - **errors**: centralized error handling
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use seabed::{EntityWorker, Lookup, Supervised, Worker};
//!
//! struct Ledger {
//!     db: sea_orm::DatabaseConnection,
//! }
//!
//! impl Worker for Ledger {
//!     fn db(&self) -> &sea_orm::DatabaseConnection {
//!         &self.db
//!     }
//! }
//!
//! struct Accounts {
//!     base: Supervised<Ledger>,
//! }
//!
//! impl Worker for Accounts {
//!     fn db(&self) -> &sea_orm::DatabaseConnection {
//!         self.base.db()
//!     }
//! }
//!
//! impl EntityWorker<account::Entity> for Accounts {}
//!
//! # async fn demo(accounts: Accounts) -> seabed::Result<()> {
//! let account = accounts.get(Lookup::key(42)).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod infra;
pub mod schema;
pub mod serialize;
pub mod types;
pub mod worker;

// Re-export commonly used types at crate root
pub use config::DbConfig;
pub use errors::{Error, OptionExt, Result};
pub use infra::Database;
pub use schema::{Field, FieldMap, FieldType, Schema, ValidationErrors};
pub use serialize::JsonSerializer;
pub use types::{Paginated, PaginationParams};
pub use worker::{
    apply_update, fetch_one, resolve_references, EntityLoader, EntityWorker, Lookup,
    ReferenceLoader, ReferenceLoaders, Supervised, Updated, Worker,
};
