//! User profile documents

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::Principal;
use crate::error::Result;
use crate::store::{to_document, DocumentStore};

/// Role stored on the user document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored user document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identity-provider subject
    #[serde(rename = "id")]
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub favorites: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Bootstrap and role lookups for user documents
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn DocumentStore>,
    table: String,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn DocumentStore>, table: &str) -> Self {
        Self {
            store,
            table: table.to_string(),
        }
    }

    /// The user document for `uid`, if one exists
    pub async fn get(&self, uid: &str) -> Result<Option<UserProfile>> {
        self.store
            .get(&self.table, uid)
            .await?
            .map(|record| record.decode())
            .transpose()
    }

    /// Create the user document for `principal` unless it already exists.
    ///
    /// Returns `true` when a document was created. A concurrent bootstrap that
    /// wins the insert counts as already existing.
    pub async fn ensure(&self, principal: &Principal) -> Result<bool> {
        if self.store.get(&self.table, &principal.uid).await?.is_some() {
            return Ok(false);
        }

        let data = to_document(&json!({
            "email": principal.email,
            "role": Role::User,
            "favorites": [],
        }))?;

        match self
            .store
            .insert_with_id(&self.table, &principal.uid, data, &["createdAt"])
            .await
        {
            Ok(_) => {
                log::info!("created user document for {}", principal.uid);
                Ok(true)
            }
            Err(err) if err.is_conflict() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Stored role for `uid`; [`Role::User`] when the document is absent
    pub async fn role(&self, uid: &str) -> Result<Role> {
        Ok(self.get(uid).await?.map(|user| user.role).unwrap_or_default())
    }
}
