//! In-memory document store (tests and local development).
//!
//! Collections live in a single `RwLock`; no guard is held across an await
//! point, so every operation is atomic with respect to the others.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{Document, DocumentStore, Query, Record};
use crate::error::{Error, Result};

#[derive(Default)]
struct State {
    collections: HashMap<String, BTreeMap<String, Document>>,
    unique: HashMap<String, Vec<String>>,
    last_stamp: Option<DateTime<Utc>>,
}

impl State {
    /// Strictly increasing clock, so consecutive writes never share a timestamp
    fn stamp(&mut self) -> Value {
        let mut now = Utc::now();
        if let Some(last) = self.last_stamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_stamp = Some(now);
        Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    fn check_unique(&self, collection: &str, id: &str, data: &Document) -> Result<()> {
        let Some(fields) = self.unique.get(collection) else {
            return Ok(());
        };
        let Some(docs) = self.collections.get(collection) else {
            return Ok(());
        };
        for field in fields {
            let Some(value) = data.get(field) else {
                continue;
            };
            let taken = docs
                .iter()
                .any(|(other_id, doc)| other_id != id && doc.get(field) == Some(value));
            if taken {
                return Err(Error::conflict(format!(
                    "{}.{} already holds {}",
                    collection, field, value
                )));
            }
        }
        Ok(())
    }

    fn put(&mut self, collection: &str, id: String, mut data: Document, timestamps: &[&str]) -> Result<Record> {
        data.remove("id");
        self.check_unique(collection, &id, &data)?;
        if !timestamps.is_empty() {
            let stamp = self.stamp();
            for field in timestamps {
                data.insert(field.to_string(), stamp.clone());
            }
        }
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data.clone());
        Ok(Record { id, data })
    }

    fn doc_mut(&mut self, collection: &str, id: &str) -> Result<&mut Document> {
        self.collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| Error::not_found(collection, id))
    }
}

/// Thread-safe in-memory [`DocumentStore`].
///
/// Keys are random UUIDs; timestamps are RFC 3339 strings with microsecond
/// precision. Uniqueness constraints can be declared per field with
/// [`InMemoryStore::with_unique`].
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `field` unique within `collection`
    pub fn with_unique(self, collection: &str, field: &str) -> Self {
        self.write()
            .unique
            .entry(collection.to_string())
            .or_default()
            .push(field.to_string());
        self
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.read().collections.get(collection).map_or(0, BTreeMap::len)
    }

    /// Whether a collection holds no documents
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, collection: &str, data: Document, timestamps: &[&str]) -> Result<Record> {
        let id = Uuid::new_v4().simple().to_string();
        log::debug!("InMemory INSERT {}/{}", collection, id);
        self.write().put(collection, id, data, timestamps)
    }

    async fn insert_with_id(
        &self,
        collection: &str,
        id: &str,
        data: Document,
        timestamps: &[&str],
    ) -> Result<Record> {
        log::debug!("InMemory INSERT {}/{}", collection, id);
        let mut state = self.write();
        let exists = state
            .collections
            .get(collection)
            .is_some_and(|docs| docs.contains_key(id));
        if exists {
            return Err(Error::conflict(format!("{}/{} already exists", collection, id)));
        }
        state.put(collection, id.to_string(), data, timestamps)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>> {
        let state = self.read();
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Record {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Record>> {
        let state = self.read();
        let Some(docs) = state.collections.get(collection) else {
            return Ok(Vec::new());
        };
        let records = docs.iter().map(|(id, data)| Record {
            id: id.clone(),
            data: data.clone(),
        });
        Ok(query.apply(records))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        mut patch: Document,
        timestamps: &[&str],
    ) -> Result<Record> {
        log::debug!("InMemory UPDATE {}/{}", collection, id);
        let mut state = self.write();
        patch.remove("id");

        let mut merged = state.doc_mut(collection, id)?.clone();
        merged.extend(patch);
        state.check_unique(collection, id, &merged)?;
        if !timestamps.is_empty() {
            let stamp = state.stamp();
            for field in timestamps {
                merged.insert(field.to_string(), stamp.clone());
            }
        }

        let doc = state.doc_mut(collection, id)?;
        *doc = merged.clone();
        Ok(Record {
            id: id.to_string(),
            data: merged,
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        log::debug!("InMemory DELETE {}/{}", collection, id);
        self.write()
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| Error::not_found(collection, id))
    }

    async fn array_union(&self, collection: &str, id: &str, field: &str, value: Value) -> Result<()> {
        let mut state = self.write();
        let doc = state.doc_mut(collection, id)?;
        match doc.get_mut(field) {
            Some(Value::Array(items)) => {
                if !items.contains(&value) {
                    items.push(value);
                }
            }
            _ => {
                doc.insert(field.to_string(), Value::Array(vec![value]));
            }
        }
        Ok(())
    }

    async fn array_remove(&self, collection: &str, id: &str, field: &str, value: Value) -> Result<()> {
        let mut state = self.write();
        let doc = state.doc_mut(collection, id)?;
        if let Some(Value::Array(items)) = doc.get_mut(field) {
            items.retain(|item| item != &value);
        }
        Ok(())
    }
}
