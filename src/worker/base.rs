//! Worker roots.
//!
//! A worker is anything holding a database session. Deepest is [`Worker`]
//! itself; [`Supervised`] builds a worker from its foreman, the business
//! object that owns the session.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::infra::Database;

/// Root of all database interactions
pub trait Worker: Send + Sync {
    /// Get database connection reference
    fn db(&self) -> &DatabaseConnection;
}

impl Worker for DatabaseConnection {
    fn db(&self) -> &DatabaseConnection {
        self
    }
}

impl Worker for Database {
    fn db(&self) -> &DatabaseConnection {
        self.connection()
    }
}

/// Handle tying a worker to its foreman.
///
/// Concrete workers embed a `Supervised<F>` and delegate [`Worker::db`] to
/// it: the session always comes from the foreman, and the foreman itself
/// stays reachable so a worker can call into its siblings.
pub struct Supervised<F> {
    foreman: Arc<F>,
}

impl<F: Worker> Supervised<F> {
    pub fn new(foreman: Arc<F>) -> Self {
        Self { foreman }
    }

    /// The parent business object.
    pub fn foreman(&self) -> &F {
        &self.foreman
    }
}

impl<F> Clone for Supervised<F> {
    fn clone(&self) -> Self {
        Self {
            foreman: self.foreman.clone(),
        }
    }
}

impl<F: Worker> Worker for Supervised<F> {
    fn db(&self) -> &DatabaseConnection {
        self.foreman.db()
    }
}
