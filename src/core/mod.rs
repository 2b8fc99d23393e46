//! Core types shared by the repository and the HTTP layer

pub mod error;
pub mod options;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use options::{FilterValue, QueryOptions, SortDirection};
