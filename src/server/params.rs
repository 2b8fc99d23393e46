//! Request-parameter parsing for collection reads
//!
//! Pagination, sorting, and filters arrive as query parameters:
//!
//! - `_page` / `_perPage` convert to an offset of `(page - 1) * perPage`
//!   and a max of `perPage`
//! - `_sortField` / `_sortDir` set the sort specification and direction
//! - `_filters` carries a JSON-encoded object of filters, parsed leniently:
//!   a malformed blob is logged and ignored, never a request failure
//! - every other parameter not starting with `_` is an implicit filter,
//!   using its first value when multi-valued; implicit entries never
//!   overwrite a key already set by the `_filters` blob

use crate::core::options::{FilterValue, QueryOptions, SortDirection};
use indexmap::IndexMap;
use serde_json::Value;

/// Parameters starting with this prefix are reserved and never become
/// implicit filters
pub const RESERVED_PREFIX: char = '_';

fn first<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Decode sorting, pagination, and filters from raw query parameters
pub fn parse_options(params: &[(String, String)]) -> QueryOptions {
    let page: u64 = first(params, "_page")
        .and_then(|value| value.parse().ok())
        .unwrap_or(1);
    let per_page: u64 = first(params, "_perPage")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);

    QueryOptions {
        sort: first(params, "_sortField").unwrap_or_default().to_string(),
        direction: first(params, "_sortDir")
            .map(SortDirection::parse)
            .unwrap_or_default(),
        offset: page.saturating_sub(1).saturating_mul(per_page),
        max: per_page,
        filters: parse_filters(params),
    }
}

/// Gather filters from the `_filters` blob and the implicit parameters
pub fn parse_filters(params: &[(String, String)]) -> IndexMap<String, FilterValue> {
    let mut filters = IndexMap::new();

    if let Some(blob) = first(params, "_filters").filter(|blob| !blob.is_empty()) {
        match serde_json::from_str::<serde_json::Map<String, Value>>(blob) {
            Ok(map) => {
                for (field, value) in map {
                    match value {
                        Value::String(s) => {
                            filters.insert(field, FilterValue::Text(s));
                        }
                        Value::Number(n) => {
                            filters.insert(
                                field,
                                FilterValue::Number(n.as_f64().unwrap_or_default()),
                            );
                        }
                        other => {
                            tracing::warn!(
                                "Ignoring non-scalar filter value for {}: {}",
                                field,
                                other
                            );
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Invalid filter specification: {} - {}", blob, e);
            }
        }
    }

    for (key, value) in params {
        if key.starts_with(RESERVED_PREFIX) {
            continue;
        }
        // First occurrence wins; blob entries are never overwritten
        filters
            .entry(key.clone())
            .or_insert_with(|| FilterValue::Text(value.clone()));
    }

    filters
}
