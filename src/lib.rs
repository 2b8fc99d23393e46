//! # Restable
//!
//! Generic entity repositories over a pluggable store, exposed as REST
//! resources.
//!
//! ## Features
//!
//! - **Entity Repository**: one generic CRUD engine per entity type, with
//!   dynamic sorting, filtering, and pagination translated into store-level
//!   query constraints
//! - **Three-Tier Filters**: registered per-field overrides, automatic
//!   numeric-id equality for `...Id` fields, and a case-insensitive prefix
//!   match for everything else, so most fields work with zero configuration
//! - **REST Controller**: the conventional verb mapping (list, show,
//!   create, update, delete) generated for any mounted resource, with a
//!   total-count header on collection reads
//! - **Authorization Hook**: a single optional access-control capability
//!   per resource; no hook means no check
//! - **Pluggable Store**: repositories speak to an object-safe driver
//!   contract; an in-memory reference store ships in the crate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use restable::prelude::*;
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Widget {
//!     #[serde(default)]
//!     id: i64,
//!     name: String,
//!     color: String,
//! }
//!
//! struct Widgets {
//!     repository: EntityRepository<Widget>,
//! }
//!
//! impl Resource for Widgets {
//!     type Entity = Widget;
//!
//!     fn resource_name(&self) -> &str {
//!         "widgets"
//!     }
//!
//!     fn repository(&self) -> &EntityRepository<Widget> {
//!         &self.repository
//!     }
//!
//!     fn entity_id(&self, entity: &Widget) -> i64 {
//!         entity.id
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     let widgets = Widgets {
//!         repository: EntityRepository::new(store, "widget"),
//!     };
//!
//!     ServerBuilder::new()
//!         .mount(Arc::new(widgets))
//!         .serve()
//!         .await
//! }
//! ```

pub mod config;
pub mod core;
pub mod repo;
pub mod server;
pub mod store;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Types ===
    pub use crate::core::{
        error::{ApiError, ApiResult, ErrorResponse},
        options::{FilterValue, QueryOptions, SortDirection},
    };

    // === Repository ===
    pub use crate::repo::{
        EntityRepository, FilterFn, QueryShaper, boolean_filter, contains_filter, id_filter,
        starts_with_filter,
    };

    // === Store Driver ===
    pub use crate::store::{MemoryStore, StoreError, StoreQuery, StoreSession};

    // === Server ===
    pub use crate::server::{
        AccessGuard, PROFILE_HEADER, Resource, ResourceDescriptor, ResourceRegistry,
        ServerBuilder, parse_options,
    };

    // === Config ===
    pub use crate::config::ServerConfig;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;

    // === Axum ===
    pub use axum::{
        Router,
        routing::{delete, get, post, put},
    };
}
