use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::ObjectStore;
use crate::error::{Error, Result};

const URL_PREFIX: &str = "memory://objects/";

/// A stored object
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-memory [`ObjectStore`]; URLs take the form `memory://objects/{key}`.
#[derive(Clone, Default)]
pub struct InMemoryObjects {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl InMemoryObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// The object stored under `key`
    pub fn get(&self, key: &str) -> Option<StoredObject> {
        match self.objects.read() {
            Ok(objects) => objects.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    /// Every stored key, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match self.objects.read() {
            Ok(objects) => objects.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        };
        keys.sort();
        keys
    }

    fn with_objects<T>(&self, f: impl FnOnce(&mut HashMap<String, StoredObject>) -> T) -> T {
        match self.objects.write() {
            Ok(mut objects) => f(&mut objects),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjects {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let object = StoredObject {
            bytes,
            content_type: content_type.to_string(),
        };
        self.with_objects(|objects| objects.insert(key.to_string(), object));
        Ok(format!("{}{}", URL_PREFIX, key))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let key = url
            .strip_prefix(URL_PREFIX)
            .ok_or_else(|| Error::validation(format!("{} is not an in-memory object URL", url)))?;
        self.with_objects(|objects| objects.remove(key))
            .map(|_| ())
            .ok_or_else(|| Error::not_found("objects", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_overwrites_and_delete_removes_once() {
        let objects = InMemoryObjects::new();
        let url = objects.put("products/A/image_0.jpg", vec![1], "image/jpeg").await.unwrap();
        objects.put("products/A/image_0.jpg", vec![2], "image/jpeg").await.unwrap();
        assert_eq!(url, "memory://objects/products/A/image_0.jpg");
        assert_eq!(objects.get("products/A/image_0.jpg").unwrap().bytes, vec![2]);

        objects.delete(&url).await.unwrap();
        assert!(objects.delete(&url).await.unwrap_err().is_not_found());
        assert!(objects.keys().is_empty());
    }
}
