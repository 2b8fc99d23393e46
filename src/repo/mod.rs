//! Entity repository: query translation and filter dispatch over the store
//! driver contract

pub mod filter;
pub mod repository;

pub use filter::{FilterFn, boolean_filter, contains_filter, id_filter, starts_with_filter};
pub use repository::{EntityRepository, QueryShaper};
