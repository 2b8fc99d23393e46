//! Generic CRUD repository over the store driver contract
//!
//! One `EntityRepository` is constructed per entity type and shared across
//! concurrent requests; it holds no per-request state. The repository owns
//! the translation of [`QueryOptions`] into store-level constraints (sort
//! rewriting, pagination bounds, and the three-tier filter dispatch) and
//! maps the driver's no-rows sentinel onto [`ApiError::NotFound`].

use crate::core::error::ApiError;
use crate::core::options::QueryOptions;
use crate::repo::filter::{FilterFn, id_filter, starts_with_filter, store_path};
use crate::store::{StoreQuery, StoreSession};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// A query-shaping strategy applied to every read query before execution
///
/// Callers that need custom shaping (eager-loading hints, scoping, ...)
/// inject one at construction instead of overriding repository methods.
pub type QueryShaper = Arc<dyn Fn(&mut dyn StoreQuery) + Send + Sync>;

/// Generic CRUD engine for one entity type backed by one logical table
///
/// The repository borrows the store session; it never owns the store's
/// connection lifecycle. The filter registry must be fully populated before
/// request handling begins; `add_filter` takes `&mut self`, so a shared
/// repository cannot be mutated.
pub struct EntityRepository<T> {
    session: Arc<dyn StoreSession>,
    table: String,
    filters: HashMap<String, FilterFn>,
    shaper: Option<QueryShaper>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> EntityRepository<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a repository for `table` on the given session
    ///
    /// The table name doubles as the entity name in diagnostics
    /// (`"widget 7 not found"`).
    pub fn new(session: Arc<dyn StoreSession>, table: impl Into<String>) -> Self {
        Self {
            session,
            table: table.into(),
            filters: HashMap::new(),
            shaper: None,
            _entity: PhantomData,
        }
    }

    /// Inject a query-shaping strategy
    pub fn with_shaper(mut self, shaper: QueryShaper) -> Self {
        self.shaper = Some(shaper);
        self
    }

    /// Register or override the filter function used for `field`
    ///
    /// Must not be called once concurrent request handling has begun.
    pub fn add_filter(&mut self, field: impl Into<String>, filter: FilterFn) {
        self.filters.insert(field.into(), filter);
    }

    /// The entity name used in URLs and diagnostics
    pub fn entity_name(&self) -> &str {
        &self.table
    }

    /// Produce a zero-valued entity
    pub fn new_instance(&self) -> T
    where
        T: Default,
    {
        T::default()
    }

    /// Produce an empty ordered collection of the entity type
    pub fn new_collection(&self) -> Vec<T> {
        Vec::new()
    }

    /// Count rows matching the filters in `options`, ignoring sort and
    /// pagination
    pub async fn count(&self, options: Option<&QueryOptions>) -> Result<i64, ApiError> {
        let mut query = self.session.query_table(&self.table);
        if let Some(options) = options {
            self.apply_filters(query.as_mut(), options);
        }
        query.count().await.map_err(ApiError::store)
    }

    /// Load exactly one entity by primary key
    pub async fn read(&self, id: i64) -> Result<T, ApiError> {
        let mut query = self.session.query_table(&self.table);
        query.filter("id", json!(id));
        self.shape(query.as_mut());
        match query.one().await {
            Ok(row) => self.decode(row),
            Err(e) if e.is_no_rows() => Err(ApiError::not_found(&self.table, id)),
            Err(e) => Err(ApiError::store(e)),
        }
    }

    /// Load entities matching the filters, in the requested sort order and
    /// pagination bounds
    ///
    /// An empty result set is not an error.
    pub async fn read_all(&self, options: Option<&QueryOptions>) -> Result<Vec<T>, ApiError> {
        let mut query = self.session.query_table(&self.table);
        if let Some(options) = options {
            self.apply_options(query.as_mut(), options);
            self.apply_filters(query.as_mut(), options);
        }
        self.shape(query.as_mut());
        let rows = query.all().await.map_err(ApiError::store)?;
        rows.into_iter().map(|row| self.decode(row)).collect()
    }

    /// Insert a new row, returning the generated primary key
    pub async fn save(&self, entity: &T) -> Result<i64, ApiError> {
        let row = self.encode(entity)?;
        self.session
            .insert(&self.table, row)
            .await
            .map_err(ApiError::store)
    }

    /// Update an existing row, optionally restricted to named columns
    ///
    /// Fails with `NotFound` when no row matched the entity's primary key.
    pub async fn update(&self, entity: &T, columns: &[&str]) -> Result<(), ApiError> {
        let row = self.encode(entity)?;
        let id = row.get("id").and_then(Value::as_i64).unwrap_or(0);
        let affected = self
            .session
            .update(&self.table, row, columns)
            .await
            .map_err(ApiError::store)?;
        if affected == 0 {
            return Err(ApiError::not_found(&self.table, id));
        }
        Ok(())
    }

    /// Delete by primary key
    ///
    /// Fails with `NotFound` when zero rows were affected.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let mut query = self.session.query_table(&self.table);
        query.filter("id", json!(id));
        let affected = query.delete().await.map_err(ApiError::store)?;
        if affected == 0 {
            return Err(ApiError::not_found(&self.table, id));
        }
        Ok(())
    }

    /// Apply sort and pagination from `options`
    fn apply_options(&self, query: &mut dyn StoreQuery, options: &QueryOptions) {
        if !options.sort.is_empty() {
            let fields = translate_sort(&options.sort, options.direction.is_descending());
            if !fields.is_empty() {
                query.order_by(&fields);
            }
        }
        if options.max > 0 {
            query.limit(options.max);
        }
        if options.offset > 0 {
            query.offset(options.offset);
        }
    }

    /// Dispatch every filter entry through the three-tier fallback:
    /// registered override, id-suffix equality, prefix match
    fn apply_filters(&self, query: &mut dyn StoreQuery, options: &QueryOptions) {
        for (field, value) in &options.filters {
            let path = store_path(field);
            let text = value.to_string();
            if let Some(filter) = self.filters.get(field) {
                filter(query, &path, &text);
            } else if path.ends_with("Id") || path.ends_with("__id") {
                id_filter(query, &path, &text);
            } else {
                starts_with_filter(query, &path, &text);
            }
        }
    }

    fn shape(&self, query: &mut dyn StoreQuery) {
        if let Some(shaper) = &self.shaper {
            shaper(query);
        }
    }

    fn encode(&self, entity: &T) -> Result<Value, ApiError> {
        serde_json::to_value(entity).map_err(|e| {
            ApiError::store(format!("failed to encode {}: {}", self.table, e))
        })
    }

    fn decode(&self, row: Value) -> Result<T, ApiError> {
        serde_json::from_value(row).map_err(|e| {
            ApiError::store(format!("failed to decode {} row: {}", self.table, e))
        })
    }
}

/// Translate a sort specification into store order fields
///
/// Splits on comma, trims each field, rewrites dotted paths, and XORs each
/// field's own sign with the global descending flag: `"name,-age"` with the
/// flag set becomes `["-name", "age"]`.
pub(crate) fn translate_sort(spec: &str, descending: bool) -> Vec<String> {
    spec.split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(|field| {
            let (field_descends, name) = match field.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, field),
            };
            let path = store_path(name);
            if field_descends ^ descending {
                format!("-{}", path)
            } else {
                path
            }
        })
        .collect()
}
