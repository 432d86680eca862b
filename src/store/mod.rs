//! Document store abstraction
//!
//! The catalogue talks to its backing database only through [`DocumentStore`]:
//! collection-style storage with keyed inserts, filtered and ordered reads,
//! partial-merge updates and atomic array membership updates. Two
//! implementations ship with the crate: [`PostgrestStore`](crate::postgrest::PostgrestStore)
//! for the hosted backend and [`InMemoryStore`] for tests and local development.

mod memory;
mod query;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub use memory::InMemoryStore;
pub use query::*;

/// A JSON document body
pub type Document = Map<String, Value>;

/// A stored document together with its store-assigned key
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Store-assigned primary key
    pub id: String,
    /// Document fields, without the key
    pub data: Document,
}

impl Record {
    /// Split a row that carries its key in an `id` column
    pub fn from_row(mut row: Document) -> Result<Self> {
        let id = match row.remove("id") {
            Some(Value::String(id)) => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(Error::store(500, "row is missing its id column")),
        };
        Ok(Self { id, data: row })
    }

    /// Deserialize the record, exposing the key as an `id` field
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut data = self.data.clone();
        data.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(data))?)
    }

    /// A single field of the document
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

/// Convert a serializable value into a document body
pub fn to_document<T: serde::Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::validation(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Collection-style document storage.
///
/// `timestamps` names fields the store fills with its own clock: on insert
/// every listed field is set, on update every listed field is refreshed.
/// Errors from the store are returned unmodified; implementations never retry.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document under a store-assigned key
    async fn insert(&self, collection: &str, data: Document, timestamps: &[&str]) -> Result<Record>;

    /// Insert a document under a caller-chosen key.
    ///
    /// Fails with [`Error::Conflict`] when the key is taken.
    async fn insert_with_id(
        &self,
        collection: &str,
        id: &str,
        data: Document,
        timestamps: &[&str],
    ) -> Result<Record>;

    /// Fetch a document by key; `Ok(None)` when absent
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>>;

    /// Fetch every document matching the query, ordered and limited as requested
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Record>>;

    /// Merge `patch` into an existing document.
    ///
    /// Fails with [`Error::NotFound`] when the key does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
        timestamps: &[&str],
    ) -> Result<Record>;

    /// Remove a document; [`Error::NotFound`] when the key does not exist
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Atomically add `value` to the array `field` unless already present
    async fn array_union(&self, collection: &str, id: &str, field: &str, value: Value) -> Result<()>;

    /// Atomically remove every occurrence of `value` from the array `field`
    async fn array_remove(&self, collection: &str, id: &str, field: &str, value: Value) -> Result<()>;

    /// Whether any document matches the query
    async fn exists(&self, collection: &str, query: &Query) -> Result<bool> {
        let first = query.clone().limit(1);
        Ok(!self.query(collection, &first).await?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Named {
        id: String,
        name: String,
    }

    #[test]
    fn decode_exposes_the_key() {
        let row = to_document(&json!({ "id": "abc", "name": "Ring" })).unwrap();
        let record = Record::from_row(row).unwrap();
        assert_eq!(record.id, "abc");
        assert!(record.field("id").is_none());

        let named: Named = record.decode().unwrap();
        assert_eq!(named.id, "abc");
        assert_eq!(named.name, "Ring");
    }

    #[test]
    fn rows_without_a_key_are_rejected() {
        let row = to_document(&json!({ "name": "Ring" })).unwrap();
        assert!(Record::from_row(row).is_err());
    }

    #[test]
    fn only_objects_become_documents() {
        assert!(to_document(&json!([1, 2])).is_err());
    }
}
