use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored document. Every document returned by a store carries its `id`.
pub type Document = Map<String, Value>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Directory store unavailable: {0}")]
    Unavailable(String),

    #[error("Document {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    #[error("Document {id} no longer matches the expected state")]
    PreconditionFailed { id: String },

    #[error("Capacity of {limit} reached for {guard}")]
    CapacityExceeded { guard: String, limit: usize },

    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Malformed(e.to_string())
    }
}

/// Predicate on a single top-level field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Gte(String, Value),
    Lte(String, Value),
}

impl Filter {
    pub fn eq(field: &str, value: impl Serialize) -> Self {
        Filter::Eq(field.to_string(), to_filter_value(value))
    }

    pub fn gte(field: &str, value: impl Serialize) -> Self {
        Filter::Gte(field.to_string(), to_filter_value(value))
    }

    pub fn lte(field: &str, value: impl Serialize) -> Self {
        Filter::Lte(field.to_string(), to_filter_value(value))
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(field, _) | Filter::Gte(field, _) | Filter::Lte(field, _) => field,
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = doc.get(self.field()) else {
            return false;
        };

        match self {
            Filter::Eq(_, expected) => actual == expected,
            Filter::Gte(_, bound) => matches!(
                compare_values(actual, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::Lte(_, bound) => matches!(
                compare_values(actual, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }

    /// PostgREST query fragment, e.g. `status=eq.approved`.
    pub fn to_query(&self) -> String {
        let (op, value) = match self {
            Filter::Eq(_, v) => ("eq", v),
            Filter::Gte(_, v) => ("gte", v),
            Filter::Lte(_, v) => ("lte", v),
        };
        let raw = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        format!("{}={}.{}", self.field(), op, urlencoding::encode(&raw))
    }
}

fn to_filter_value(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Numbers compare numerically, strings lexicographically (ISO dates sort
/// chronologically). Mixed types never compare.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

pub fn matches_all(filters: &[Filter], doc: &Document) -> bool {
    filters.iter().all(|f| f.matches(doc))
}

/// Upper bound on the number of documents matching `filters`. `name` is
/// reported back in [`StoreError::CapacityExceeded`].
#[derive(Debug, Clone)]
pub struct CapacityGuard {
    pub name: String,
    pub filters: Vec<Filter>,
    pub limit: usize,
}

impl CapacityGuard {
    pub fn new(name: &str, filters: Vec<Filter>, limit: usize) -> Self {
        Self {
            name: name.to_string(),
            filters,
            limit,
        }
    }

    pub fn exceeded(&self) -> StoreError {
        StoreError::CapacityExceeded {
            guard: self.name.clone(),
            limit: self.limit,
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Insert a new document and return its generated id.
    async fn create(&self, collection: &str, fields: Document) -> Result<String, StoreError>;

    /// Shallow-merge `partial` into an existing document.
    async fn update(&self, collection: &str, id: &str, partial: Document) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Insert only while every guard has fewer than `limit` matching documents.
    /// Guards are checked in order; the first one full is reported. The counts
    /// and the insert happen atomically.
    async fn create_guarded(
        &self,
        collection: &str,
        fields: Document,
        guards: &[CapacityGuard],
    ) -> Result<String, StoreError>;

    /// Apply `partial` only if the document still matches `expected` and every
    /// guard has fewer than `limit` other matching documents. The checks and the
    /// write happen atomically.
    async fn update_guarded(
        &self,
        collection: &str,
        id: &str,
        expected: &[Filter],
        partial: Document,
        guards: &[CapacityGuard],
    ) -> Result<(), StoreError>;
}

/// Serialize a typed record into a document, dropping `id` if present.
pub fn to_document<T: Serialize>(record: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(StoreError::Malformed(format!("expected an object, got {}", other))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}
