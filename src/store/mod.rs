//! Store driver contract
//!
//! The repository talks to the persistence engine exclusively through the
//! [`StoreSession`] and [`StoreQuery`] traits. The engine itself is an
//! external collaborator: it executes field-level filter/sort/limit/offset
//! and basic CRUD over named fields and owns its own connection
//! lifecycle. The repository only borrows a session handle.
//!
//! # Field paths
//!
//! Filter and sort fields use `__` as the join-path separator for
//! related/nested fields (`owner__id`). A field may additionally carry a
//! lookup marker as its last segment: `istartswith` (case-insensitive
//! prefix) or `icontains` (case-insensitive substring). Without a marker
//! the constraint is an equality check. Sort fields carry a leading `-`
//! for descending order.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Errors surfaced by a store driver
///
/// `NoRows` is a sentinel: it is the only variant that repository code maps
/// to a not-found outcome, and it must stay distinguishable from every
/// other failure.
#[derive(Debug)]
pub enum StoreError {
    /// The query matched no rows
    NoRows,

    /// Any other driver failure (constraint violation, connectivity, ...)
    Backend { message: String },
}

impl StoreError {
    /// Build a backend error from any displayable cause
    pub fn backend(cause: impl fmt::Display) -> Self {
        StoreError::Backend {
            message: cause.to_string(),
        }
    }

    /// Whether this is the no-rows sentinel
    pub fn is_no_rows(&self) -> bool {
        matches!(self, StoreError::NoRows)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NoRows => write!(f, "no rows in result set"),
            StoreError::Backend { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for StoreError {}

/// A query under construction against one table
///
/// Builder methods accumulate constraints; the executor methods run the
/// query. Rows cross the boundary as JSON objects so the contract stays
/// object-safe and entity-agnostic.
#[async_trait]
pub trait StoreQuery: Send {
    /// Add one field constraint (see the module docs for the path syntax)
    fn filter(&mut self, field: &str, value: Value);

    /// Set the sort order (`-` prefix per field for descending)
    fn order_by(&mut self, fields: &[String]);

    /// Cap the number of returned rows
    fn limit(&mut self, n: u64);

    /// Skip leading rows
    fn offset(&mut self, n: u64);

    /// Count matching rows, ignoring limit/offset
    async fn count(&mut self) -> Result<i64, StoreError>;

    /// Return the first matching row, or the `NoRows` sentinel
    async fn one(&mut self) -> Result<Value, StoreError>;

    /// Return all matching rows in the requested order and bounds
    async fn all(&mut self) -> Result<Vec<Value>, StoreError>;

    /// Delete matching rows, returning how many were affected
    async fn delete(&mut self) -> Result<u64, StoreError>;
}

/// A live session against the persistence engine
#[async_trait]
pub trait StoreSession: Send + Sync {
    /// Start a query against a named table
    fn query_table(&self, table: &str) -> Box<dyn StoreQuery>;

    /// Insert one row, returning the generated primary key
    async fn insert(&self, table: &str, row: Value) -> Result<i64, StoreError>;

    /// Update the row identified by the primary key inside `row`
    ///
    /// When `columns` is non-empty only those fields are written. Returns
    /// the number of affected rows; zero means the row does not exist.
    async fn update(&self, table: &str, row: Value, columns: &[&str]) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rows_sentinel_is_distinguishable() {
        assert!(StoreError::NoRows.is_no_rows());
        assert!(!StoreError::backend("disk on fire").is_no_rows());
    }

    #[test]
    fn test_backend_error_keeps_message() {
        let err = StoreError::backend("duplicate primary key 7");
        assert_eq!(err.to_string(), "duplicate primary key 7");
    }
}
