//! Worker layer - schema-driven data access over one session.
//!
//! Workers wrap an injected database session. [`Supervised`] ties a worker
//! to the business object owning the session, and [`EntityWorker`] adds
//! unified get / find / update operations for one mapped entity.

mod base;
mod entity;
mod reference;

pub use base::{Supervised, Worker};
pub use entity::{apply_update, fetch_one, EntityWorker, Lookup, Updated};
pub use reference::{resolve_references, EntityLoader, ReferenceLoader, ReferenceLoaders};

// Export mock for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use reference::MockReferenceLoader;
