//! Filter functions: per-field translation of raw request values into
//! store-level constraints
//!
//! A repository resolves each filter field in priority order: a registered
//! override, then the id-suffix rule, then the case-insensitive prefix
//! match. The built-ins here cover the last two tiers and the common
//! override cases (boolean, substring), so most fields need no
//! registration at all.

use crate::store::StoreQuery;
use serde_json::json;
use std::sync::Arc;

/// A filter-translation function
///
/// Receives the query under construction, the field path already rewritten
/// to the store's join-path form, and the raw value coerced to a string.
pub type FilterFn = Arc<dyn Fn(&mut dyn StoreQuery, &str, &str) + Send + Sync>;

/// Rewrite a dotted field path to the store's join-path separator
/// (`owner.id` becomes `owner__id`)
pub(crate) fn store_path(field: &str) -> String {
    field.replace('.', "__")
}

/// Equality on a numeric id
///
/// Strips the `Id` (or `__id`) suffix, appends the join-id marker, and
/// filters on the integer value. A malformed id filters as zero rather
/// than failing the request.
pub fn id_filter(query: &mut dyn StoreQuery, field: &str, value: &str) {
    let base = field
        .strip_suffix("__id")
        .or_else(|| field.strip_suffix("Id"))
        .unwrap_or(field);
    let id: i64 = value.parse().unwrap_or(0);
    query.filter(&format!("{}__id", base), json!(id));
}

/// Case-insensitive prefix match
pub fn starts_with_filter(query: &mut dyn StoreQuery, field: &str, value: &str) {
    query.filter(&format!("{}__istartswith", field), json!(value));
}

/// Case-insensitive substring match
pub fn contains_filter(query: &mut dyn StoreQuery, field: &str, value: &str) {
    query.filter(&format!("{}__icontains", field), json!(value));
}

/// Boolean equality; any value other than `"true"` means false
pub fn boolean_filter(query: &mut dyn StoreQuery, field: &str, value: &str) {
    query.filter(field, json!(value == "true"));
}
