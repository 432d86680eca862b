//! Document store backed by the hosted PostgREST API
//!
//! Each collection maps to a table under `/rest/v1/{table}` whose primary key
//! column is `id`. Store-assigned timestamps come from column defaults and an
//! update trigger, and atomic array updates go through two RPC functions; both
//! are defined in `sql/schema.sql`.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::fetch::Transport;
use crate::store::{Document, DocumentStore, Query, Record};

const ARRAY_ADD_RPC: &str = "catalogue_array_add";
const ARRAY_REMOVE_RPC: &str = "catalogue_array_remove";

/// [`DocumentStore`] over PostgREST
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    transport: Transport,
}

impl PostgrestStore {
    /// Create a store that issues requests through `transport`
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Get the REST path for a table
    fn table_path(table: &str) -> String {
        format!("/rest/v1/{}", table)
    }

    fn by_id(id: &str) -> Vec<(String, String)> {
        vec![("id".to_string(), format!("eq.{}", id))]
    }

    /// Drop fields the database fills itself
    fn strip(mut data: Document, timestamps: &[&str]) -> Document {
        data.remove("id");
        for field in timestamps {
            data.remove(*field);
        }
        data
    }

    fn first(rows: Vec<Document>) -> Result<Option<Record>> {
        rows.into_iter().next().map(Record::from_row).transpose()
    }

    async fn post_row(&self, table: &str, body: Document) -> Result<Record> {
        let rows = self
            .transport
            .post(&Self::table_path(table))
            .header("Prefer", "return=representation")
            .json(&body)?
            .execute::<Vec<Document>>()
            .await?;

        Self::first(rows)?.ok_or_else(|| Error::store(500, format!("insert into {} returned no rows", table)))
    }

    async fn call_array_rpc(&self, function: &str, table: &str, id: &str, field: &str, value: Value) -> Result<()> {
        let params = json!({
            "p_table": table,
            "p_id": id,
            "p_field": field,
            "p_value": value,
        });

        let found = self
            .transport
            .post(&format!("/rest/v1/rpc/{}", function))
            .json(&params)?
            .execute::<bool>()
            .await?;

        if found {
            Ok(())
        } else {
            Err(Error::not_found(table, id))
        }
    }
}

#[async_trait]
impl DocumentStore for PostgrestStore {
    async fn insert(&self, collection: &str, data: Document, timestamps: &[&str]) -> Result<Record> {
        self.post_row(collection, Self::strip(data, timestamps)).await
    }

    async fn insert_with_id(
        &self,
        collection: &str,
        id: &str,
        data: Document,
        timestamps: &[&str],
    ) -> Result<Record> {
        let mut body = Self::strip(data, timestamps);
        body.insert("id".to_string(), Value::String(id.to_string()));
        self.post_row(collection, body).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>> {
        let query = Query::new().eq("id", id).limit(1);
        let rows = self
            .transport
            .get(&Self::table_path(collection))
            .query(query.to_params())
            .execute::<Vec<Document>>()
            .await?;
        Self::first(rows)
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Record>> {
        let rows = self
            .transport
            .get(&Self::table_path(collection))
            .query(query.to_params())
            .execute::<Vec<Document>>()
            .await?;
        rows.into_iter().map(Record::from_row).collect()
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
        timestamps: &[&str],
    ) -> Result<Record> {
        let rows = self
            .transport
            .patch(&Self::table_path(collection))
            .header("Prefer", "return=representation")
            .query(Self::by_id(id))
            .json(&Self::strip(patch, timestamps))?
            .execute::<Vec<Document>>()
            .await?;

        Self::first(rows)?.ok_or_else(|| Error::not_found(collection, id))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let rows = self
            .transport
            .delete(&Self::table_path(collection))
            .header("Prefer", "return=representation")
            .query(Self::by_id(id))
            .execute::<Vec<Document>>()
            .await?;

        if rows.is_empty() {
            Err(Error::not_found(collection, id))
        } else {
            Ok(())
        }
    }

    async fn array_union(&self, collection: &str, id: &str, field: &str, value: Value) -> Result<()> {
        self.call_array_rpc(ARRAY_ADD_RPC, collection, id, field, value).await
    }

    async fn array_remove(&self, collection: &str, id: &str, field: &str, value: Value) -> Result<()> {
        self.call_array_rpc(ARRAY_REMOVE_RPC, collection, id, field, value).await
    }
}
