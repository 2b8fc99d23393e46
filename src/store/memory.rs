//! In-memory implementation of the store driver contract
//!
//! Useful for testing and development. Rows are JSON objects keyed by their
//! integer primary key; a `RwLock` provides thread-safe access. Nested
//! `__` paths traverse JSON objects, which stands in for the join paths a
//! relational driver would resolve.

use super::{StoreError, StoreQuery, StoreSession};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Value>,
}

/// In-memory store session
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreSession for MemoryStore {
    fn query_table(&self, table: &str) -> Box<dyn StoreQuery> {
        Box::new(MemoryQuery {
            tables: self.tables.clone(),
            table: table.to_string(),
            constraints: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: 0,
        })
    }

    async fn insert(&self, table: &str, row: Value) -> Result<i64, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| StoreError::backend(format!("Failed to acquire write lock: {}", e)))?;
        let table = tables.entry(table.to_string()).or_default();

        let Value::Object(mut object) = row else {
            return Err(StoreError::backend("row must be a JSON object"));
        };

        let id = match object.get("id").and_then(Value::as_i64) {
            Some(id) if id > 0 => {
                if table.rows.contains_key(&id) {
                    return Err(StoreError::backend(format!("duplicate primary key {}", id)));
                }
                table.next_id = table.next_id.max(id);
                id
            }
            _ => {
                table.next_id += 1;
                table.next_id
            }
        };

        object.insert("id".to_string(), Value::from(id));
        table.rows.insert(id, Value::Object(object));
        Ok(id)
    }

    async fn update(&self, table: &str, row: Value, columns: &[&str]) -> Result<u64, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| StoreError::backend(format!("Failed to acquire write lock: {}", e)))?;

        let Value::Object(object) = row else {
            return Err(StoreError::backend("row must be a JSON object"));
        };
        let Some(id) = object.get("id").and_then(Value::as_i64) else {
            return Err(StoreError::backend("row has no primary key"));
        };

        let Some(existing) = tables
            .get_mut(table)
            .and_then(|table| table.rows.get_mut(&id))
        else {
            return Ok(0);
        };

        if columns.is_empty() {
            *existing = Value::Object(object);
        } else if let Some(fields) = existing.as_object_mut() {
            for column in columns {
                if let Some(value) = object.get(*column) {
                    fields.insert(column.to_string(), value.clone());
                }
            }
        }
        Ok(1)
    }
}

enum Lookup {
    Exact,
    IStartsWith,
    IContains,
}

struct Constraint {
    path: Vec<String>,
    lookup: Lookup,
    value: Value,
}

/// A query against one in-memory table
pub struct MemoryQuery {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    table: String,
    constraints: Vec<Constraint>,
    order: Vec<String>,
    limit: Option<u64>,
    offset: u64,
}

impl MemoryQuery {
    fn matches(&self, row: &Value) -> bool {
        self.constraints.iter().all(|constraint| {
            let Some(actual) = field_at(row, &constraint.path) else {
                return false;
            };
            match constraint.lookup {
                Lookup::Exact => value_eq(actual, &constraint.value),
                Lookup::IStartsWith => text_match(actual, &constraint.value, |a, e| {
                    a.starts_with(e)
                }),
                Lookup::IContains => text_match(actual, &constraint.value, |a, e| {
                    a.contains(e)
                }),
            }
        })
    }

    /// Matching rows in primary-key order, before sort and bounds
    fn matching_rows(&self) -> Result<Vec<Value>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::backend(format!("Failed to acquire read lock: {}", e)))?;
        let Some(table) = tables.get(&self.table) else {
            return Ok(Vec::new());
        };
        Ok(table
            .rows
            .values()
            .filter(|row| self.matches(row))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StoreQuery for MemoryQuery {
    fn filter(&mut self, field: &str, value: Value) {
        self.constraints.push(parse_constraint(field, value));
    }

    fn order_by(&mut self, fields: &[String]) {
        self.order = fields.to_vec();
    }

    fn limit(&mut self, n: u64) {
        self.limit = Some(n);
    }

    fn offset(&mut self, n: u64) {
        self.offset = n;
    }

    async fn count(&mut self) -> Result<i64, StoreError> {
        Ok(self.matching_rows()?.len() as i64)
    }

    async fn one(&mut self) -> Result<Value, StoreError> {
        self.matching_rows()?
            .into_iter()
            .next()
            .ok_or(StoreError::NoRows)
    }

    async fn all(&mut self) -> Result<Vec<Value>, StoreError> {
        let mut rows = self.matching_rows()?;
        if !self.order.is_empty() {
            rows.sort_by(|a, b| compare(a, b, &self.order));
        }
        let rows = rows.into_iter().skip(self.offset as usize);
        Ok(match self.limit {
            Some(n) => rows.take(n as usize).collect(),
            None => rows.collect(),
        })
    }

    async fn delete(&mut self) -> Result<u64, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| StoreError::backend(format!("Failed to acquire write lock: {}", e)))?;
        let Some(table) = tables.get_mut(&self.table) else {
            return Ok(0);
        };
        let doomed: Vec<i64> = table
            .rows
            .iter()
            .filter(|(_, row)| self.matches(row))
            .map(|(id, _)| *id)
            .collect();
        for id in &doomed {
            table.rows.remove(id);
        }
        Ok(doomed.len() as u64)
    }
}

fn parse_constraint(field: &str, value: Value) -> Constraint {
    let mut path: Vec<String> = field.split("__").map(str::to_string).collect();
    let lookup = match path.last().map(String::as_str) {
        Some("istartswith") => {
            path.pop();
            Lookup::IStartsWith
        }
        Some("icontains") => {
            path.pop();
            Lookup::IContains
        }
        _ => Lookup::Exact,
    };
    Constraint {
        path,
        lookup,
        value,
    }
}

fn field_at<'a>(row: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = row;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Equality with numeric coercion (5 matches 5.0)
fn value_eq(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(e)) => a == e,
        _ => actual == expected,
    }
}

/// Case-insensitive text comparison over scalar fields
fn text_match(actual: &Value, expected: &Value, predicate: impl Fn(&str, &str) -> bool) -> bool {
    let (Some(actual), Some(expected)) = (scalar_text(actual), scalar_text(expected)) else {
        return false;
    };
    predicate(&actual.to_lowercase(), &expected.to_lowercase())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn compare(a: &Value, b: &Value, order: &[String]) -> Ordering {
    for key in order {
        let (descending, name) = match key.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, key.as_str()),
        };
        let path: Vec<String> = name.split("__").map(str::to_string).collect();
        let mut ordering = value_cmp(field_at(a, &path), field_at(b, &path));
        if descending {
            ordering = ordering.reverse();
        }
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Missing fields and nulls sort first; mixed types compare equal
fn value_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let first = store
            .insert("widget", json!({"name": "a"}))
            .await
            .unwrap();
        let second = store
            .insert("widget", json!({"name": "b"}))
            .await
            .unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn test_insert_honours_explicit_id_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let id = store
            .insert("widget", json!({"id": 10, "name": "a"}))
            .await
            .unwrap();
        assert_eq!(id, 10);

        let err = store
            .insert("widget", json!({"id": 10, "name": "b"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("duplicate primary key"));

        // Sequence continues past the explicit id
        let next = store.insert("widget", json!({"name": "c"})).await.unwrap();
        assert_eq!(next, 11);
    }

    #[tokio::test]
    async fn test_one_returns_no_rows_sentinel() {
        let store = MemoryStore::new();
        let mut query = store.query_table("widget");
        query.filter("id", json!(1));
        let err = query.one().await.unwrap_err();
        assert!(err.is_no_rows());
    }

    #[tokio::test]
    async fn test_exact_filter_with_numeric_coercion() {
        let store = MemoryStore::new();
        store
            .insert("widget", json!({"stock": 5}))
            .await
            .unwrap();

        let mut query = store.query_table("widget");
        query.filter("stock", json!(5.0));
        assert_eq!(query.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_nested_path_filter() {
        let store = MemoryStore::new();
        store
            .insert("widget", json!({"name": "a", "owner": {"id": 3}}))
            .await
            .unwrap();
        store
            .insert("widget", json!({"name": "b", "owner": {"id": 4}}))
            .await
            .unwrap();

        let mut query = store.query_table("widget");
        query.filter("owner__id", json!(3));
        let rows = query.all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "a");
    }

    #[tokio::test]
    async fn test_istartswith_is_case_insensitive() {
        let store = MemoryStore::new();
        store
            .insert("widget", json!({"color": "red velvet"}))
            .await
            .unwrap();
        store
            .insert("widget", json!({"color": "Blue"}))
            .await
            .unwrap();

        let mut query = store.query_table("widget");
        query.filter("color__istartswith", json!("Red"));
        let rows = query.all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["color"], "red velvet");
    }

    #[tokio::test]
    async fn test_icontains() {
        let store = MemoryStore::new();
        store
            .insert("widget", json!({"name": "flux capacitor"}))
            .await
            .unwrap();
        store
            .insert("widget", json!({"name": "sprocket"}))
            .await
            .unwrap();

        let mut query = store.query_table("widget");
        query.filter("name__icontains", json!("CAPA"));
        assert_eq!(query.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_order_limit_offset() {
        let store = MemoryStore::new();
        for (name, stock) in [("b", 1), ("a", 2), ("c", 3), ("d", 4)] {
            store
                .insert("widget", json!({"name": name, "stock": stock}))
                .await
                .unwrap();
        }

        let mut query = store.query_table("widget");
        query.order_by(&["-name".to_string()]);
        query.offset(1);
        query.limit(2);
        let rows = query.all().await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_multi_key_sort() {
        let store = MemoryStore::new();
        for (name, stock) in [("a", 2), ("a", 1), ("b", 1)] {
            store
                .insert("widget", json!({"name": name, "stock": stock}))
                .await
                .unwrap();
        }

        let mut query = store.query_table("widget");
        query.order_by(&["name".to_string(), "-stock".to_string()]);
        let rows = query.all().await.unwrap();
        let stocks: Vec<i64> = rows.iter().map(|r| r["stock"].as_i64().unwrap()).collect();
        assert_eq!(stocks, vec![2, 1, 1]);
    }

    #[tokio::test]
    async fn test_count_ignores_limit_and_offset() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .insert("widget", json!({"stock": i}))
                .await
                .unwrap();
        }

        let mut query = store.query_table("widget");
        query.limit(2);
        query.offset(1);
        assert_eq!(query.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_delete_reports_affected_rows() {
        let store = MemoryStore::new();
        store
            .insert("widget", json!({"color": "red"}))
            .await
            .unwrap();
        store
            .insert("widget", json!({"color": "red"}))
            .await
            .unwrap();
        store
            .insert("widget", json!({"color": "blue"}))
            .await
            .unwrap();

        let mut query = store.query_table("widget");
        query.filter("color", json!("red"));
        assert_eq!(query.delete().await.unwrap(), 2);

        let mut remaining = store.query_table("widget");
        assert_eq!(remaining.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_affects_zero_rows_for_missing_id() {
        let store = MemoryStore::new();
        let affected = store
            .update("widget", json!({"id": 99, "name": "ghost"}), &[])
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_update_restricted_to_columns() {
        let store = MemoryStore::new();
        let id = store
            .insert("widget", json!({"name": "a", "color": "red"}))
            .await
            .unwrap();

        let affected = store
            .update(
                "widget",
                json!({"id": id, "name": "b", "color": "blue"}),
                &["color"],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let mut query = store.query_table("widget");
        query.filter("id", json!(id));
        let row = query.one().await.unwrap();
        assert_eq!(row["name"], "a");
        assert_eq!(row["color"], "blue");
    }

    #[tokio::test]
    async fn test_query_against_missing_table_is_empty() {
        let store = MemoryStore::new();
        let mut query = store.query_table("nowhere");
        assert_eq!(query.count().await.unwrap(), 0);
        assert!(query.all().await.unwrap().is_empty());
        assert_eq!(query.delete().await.unwrap(), 0);
    }
}
