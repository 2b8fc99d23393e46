//! Query options: the decoded request intent for sorting, pagination, and
//! filtering, independent of any protocol.

use indexmap::IndexMap;
use std::fmt;

/// Global sort-direction override for a collection read
///
/// `Descending` flips the sign of every field in the sort specification;
/// a field already marked descending with a leading `-` becomes ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// No override; each field keeps its own sign
    #[default]
    Unspecified,
    Ascending,
    Descending,
}

impl SortDirection {
    /// Parse a direction parameter, case-insensitively
    ///
    /// Anything other than `asc`/`desc` means no override.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Ascending,
            "desc" => SortDirection::Descending,
            _ => SortDirection::Unspecified,
        }
    }

    /// Whether this override inverts the per-field sign
    pub fn is_descending(self) -> bool {
        matches!(self, SortDirection::Descending)
    }
}

/// A raw filter value as it arrived in the request
///
/// The variant is decided once, at the request-parsing boundary; downstream
/// code never inspects JSON types again.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for FilterValue {
    /// Numbers render with full precision: no exponent notation, no
    /// superfluous trailing zeros (`3.0` formats as `3`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Number(n) => write!(f, "{}", n),
            FilterValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Requested sorting, pagination, and filtering for a collection operation
///
/// # Invariants
///
/// - `offset` and `max` are applied only when greater than zero
///   (`max == 0` means unbounded)
/// - `sort` is ignored when empty
/// - `filters` preserves insertion order; the request parser relies on it
///   when merging filter sources
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Comma-separated field names, each optionally prefixed `-` for
    /// descending; dotted paths address related/nested fields
    pub sort: String,

    /// Global direction override, XOR-ed with each field's own sign
    pub direction: SortDirection,

    /// Number of rows to skip
    pub offset: u64,

    /// Maximum number of rows to return (0 = unbounded)
    pub max: u64,

    /// Field path to raw filter value
    pub filters: IndexMap<String, FilterValue>,
}

impl QueryOptions {
    /// Create empty options (no sort, no pagination, no filters)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sort specification and direction override
    pub fn with_sort(mut self, sort: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = sort.into();
        self.direction = direction;
        self
    }

    /// Set pagination bounds
    pub fn with_page(mut self, offset: u64, max: u64) -> Self {
        self.offset = offset;
        self.max = max;
        self
    }

    /// Add one filter entry
    pub fn with_filter(mut self, field: impl Into<String>, value: FilterValue) -> Self {
        self.filters.insert(field.into(), value);
        self
    }
}
