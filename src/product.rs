//! Product catalogue repository

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identifier::{IdPolicy, ProductIdGenerator, PRODUCT_ID_FIELD};
use crate::images::Gallery;
use crate::store::{to_document, DocumentStore, Query, Record, SortOrder};

const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

/// Product category.
///
/// Stored as a free string; values outside the known set survive as
/// [`Category::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Necklaces,
    Rings,
    Earrings,
    Bracelets,
    Pendants,
    Sets,
    Other,
    Custom(String),
}

impl Category {
    /// The categories offered by the admin form, in display order
    pub const ALL: [Category; 7] = [
        Category::Necklaces,
        Category::Rings,
        Category::Earrings,
        Category::Bracelets,
        Category::Pendants,
        Category::Sets,
        Category::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Necklaces => "Necklaces",
            Category::Rings => "Rings",
            Category::Earrings => "Earrings",
            Category::Bracelets => "Bracelets",
            Category::Pendants => "Pendants",
            Category::Sets => "Sets",
            Category::Other => "Other",
            Category::Custom(name) => name,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Necklaces" => Category::Necklaces,
            "Rings" => Category::Rings,
            "Earrings" => Category::Earrings,
            "Bracelets" => Category::Bracelets,
            "Pendants" => Category::Pendants,
            "Sets" => Category::Sets,
            "Other" => Category::Other,
            _ => Category::Custom(value),
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Empty strings from form input mean "no category"
fn blank_category<'de, D>(deserializer: D) -> std::result::Result<Option<Category>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()).map(Category::from))
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A stored product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned key
    pub id: String,
    /// Human-facing identifier, upper case
    pub product_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "blank_category")]
    pub category: Option<Category>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub purity: Option<String>,
    #[serde(default)]
    pub stone: Option<String>,
    #[serde(default)]
    pub main_image: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Main image followed by the gallery
    pub fn all_images(&self) -> Vec<&str> {
        self.main_image
            .iter()
            .chain(self.images.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Fields supplied when creating a product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(
        default,
        deserialize_with = "blank_category",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stone: Option<String>,
    #[serde(default)]
    pub main_image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ProductDraft {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<Category>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, value: &str) -> Self {
        self.description = Some(value.to_string());
        self
    }

    pub fn with_material(mut self, value: &str) -> Self {
        self.material = Some(value.to_string());
        self
    }

    pub fn with_weight(mut self, value: &str) -> Self {
        self.weight = Some(value.to_string());
        self
    }

    pub fn with_purity(mut self, value: &str) -> Self {
        self.purity = Some(value.to_string());
        self
    }

    pub fn with_stone(mut self, value: &str) -> Self {
        self.stone = Some(value.to_string());
        self
    }

    /// Set the main image and gallery from an arranged gallery
    pub fn with_gallery(mut self, gallery: Gallery) -> Self {
        self.main_image = gallery.main_image;
        self.images = gallery.images;
        self
    }

    /// Reject drafts without a name
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Product name is required."));
        }
        Ok(())
    }
}

/// Partial update of a product; `None` leaves a field untouched.
///
/// The identifier and creation timestamp have no counterpart here and so
/// cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stone: Option<String>,
    /// `Some(None)` clears the main image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_image: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ProductPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, value: &str) -> Self {
        self.name = Some(value.to_string());
        self
    }

    pub fn category(mut self, value: impl Into<Category>) -> Self {
        self.category = Some(value.into());
        self
    }

    pub fn description(mut self, value: &str) -> Self {
        self.description = Some(value.to_string());
        self
    }

    pub fn material(mut self, value: &str) -> Self {
        self.material = Some(value.to_string());
        self
    }

    pub fn weight(mut self, value: &str) -> Self {
        self.weight = Some(value.to_string());
        self
    }

    pub fn purity(mut self, value: &str) -> Self {
        self.purity = Some(value.to_string());
        self
    }

    pub fn stone(mut self, value: &str) -> Self {
        self.stone = Some(value.to_string());
        self
    }

    /// Replace both the main image and the gallery
    pub fn gallery(mut self, gallery: Gallery) -> Self {
        self.main_image = Some(gallery.main_image);
        self.images = Some(gallery.images);
        self
    }
}

/// Keys assigned by [`ProductRepository::create`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProduct {
    pub id: String,
    pub product_id: String,
}

/// Collections-page filter: a category (or all) plus free-text search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogueFilter {
    pub category: Option<Category>,
    pub search: Option<String>,
}

impl CatalogueFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<Category>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn search(mut self, text: &str) -> Self {
        self.search = Some(text.to_string());
        self
    }

    /// Category equality plus a case-insensitive substring match on the name,
    /// identifier or description
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if product.category.as_ref().map(Category::as_str) != Some(category.as_str()) {
                return false;
            }
        }

        let needle = match self.search.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_lowercase(),
            _ => return true,
        };
        [
            Some(product.name.as_str()),
            Some(product.product_id.as_str()),
            product.description.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Label grouping products without a category in [`CatalogueSummary`]
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Admin dashboard figures
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueSummary {
    pub total: usize,
    /// Product count per category label, largest first
    pub by_category: Vec<(String, usize)>,
    /// The most recent products, newest first
    pub recent: Vec<Product>,
}

impl CatalogueSummary {
    /// Summarize `products`, which are expected newest first
    pub fn from_products(products: Vec<Product>, recent: usize) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for product in &products {
            let label = match product.category.as_ref().map(|c| c.as_str().trim()) {
                Some(label) if !label.is_empty() => label.to_string(),
                _ => UNCATEGORIZED.to_string(),
            };
            *counts.entry(label).or_default() += 1;
        }

        let mut by_category: Vec<(String, usize)> = counts.into_iter().collect();
        by_category.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let total = products.len();
        Self {
            total,
            by_category,
            recent: products.into_iter().take(recent).collect(),
        }
    }
}

/// CRUD and query operations over the product collection.
///
/// Each operation is independent; nothing is cached and no store error is
/// retried.
#[derive(Clone)]
pub struct ProductRepository {
    store: Arc<dyn DocumentStore>,
    table: String,
    policy: IdPolicy,
    featured_count: usize,
}

impl ProductRepository {
    pub fn new(store: Arc<dyn DocumentStore>, table: &str, policy: IdPolicy, featured_count: usize) -> Self {
        Self {
            store,
            table: table.to_string(),
            policy,
            featured_count,
        }
    }

    fn id_generator(&self) -> ProductIdGenerator<'_> {
        ProductIdGenerator::new(self.store.as_ref(), &self.table, self.policy)
    }

    fn newest_first() -> Query {
        Query::new().order(CREATED_AT, SortOrder::Descending)
    }

    fn decode_all(records: Vec<Record>) -> Result<Vec<Product>> {
        records.iter().map(Record::decode).collect()
    }

    /// An identifier no stored product carries
    pub async fn generate_unique_id(&self) -> Result<String> {
        self.id_generator().generate_unique().await
    }

    /// Persist a new product under a fresh identifier.
    ///
    /// An insert rejected by the store's uniqueness constraint (a concurrent
    /// create took the identifier) is retried with a new identifier, at most
    /// `max_attempts` times.
    pub async fn create(&self, data: &ProductDraft) -> Result<CreatedProduct> {
        let mut body = to_document(data)?;
        let mut conflicts = 0;
        loop {
            let product_id = self.generate_unique_id().await?;
            body.insert(PRODUCT_ID_FIELD.to_string(), product_id.clone().into());

            match self
                .store
                .insert(&self.table, body.clone(), &[CREATED_AT, UPDATED_AT])
                .await
            {
                Ok(record) => {
                    log::info!("created product {} ({})", product_id, record.id);
                    return Ok(CreatedProduct {
                        id: record.id,
                        product_id,
                    });
                }
                Err(err) if err.is_conflict() && conflicts + 1 < self.policy.max_attempts => {
                    conflicts += 1;
                    log::warn!("product id {} claimed concurrently, regenerating", product_id);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Merge `data` into the product and refresh `updatedAt`
    pub async fn update(&self, id: &str, data: &ProductPatch) -> Result<Product> {
        let patch = to_document(data)?;
        let record = self.store.update(&self.table, id, patch, &[UPDATED_AT]).await?;
        record.decode()
    }

    /// Remove the product. Its stored images are left in place.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(&self.table, id).await?;
        log::info!("deleted product {}", id);
        Ok(())
    }

    /// The product with key `id`, or `None`
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Product>> {
        self.store
            .get(&self.table, id)
            .await?
            .map(|record| record.decode())
            .transpose()
    }

    /// Every product, newest first
    pub async fn get_all(&self) -> Result<Vec<Product>> {
        let records = self.store.query(&self.table, &Self::newest_first()).await?;
        Self::decode_all(records)
    }

    /// Products in `category`, newest first
    pub async fn get_by_category(&self, category: &Category) -> Result<Vec<Product>> {
        let query = Self::newest_first().eq("category", category.as_str());
        let records = self.store.query(&self.table, &query).await?;
        Self::decode_all(records)
    }

    /// The `count` most recent products
    pub async fn get_featured(&self, count: usize) -> Result<Vec<Product>> {
        let query = Self::newest_first().limit(count);
        let records = self.store.query(&self.table, &query).await?;
        Self::decode_all(records)
    }

    /// The configured number of most recent products
    pub async fn get_featured_default(&self) -> Result<Vec<Product>> {
        self.get_featured(self.featured_count).await
    }

    /// Products whose identifier equals `product_id`, compared upper-cased
    pub async fn search_by_external_id(&self, product_id: &str) -> Result<Vec<Product>> {
        let normalized = product_id.trim().to_uppercase();
        let query = Query::new().eq(PRODUCT_ID_FIELD, normalized);
        let records = self.store.query(&self.table, &query).await?;
        Self::decode_all(records)
    }

    /// Every product passing the collections-page filter, newest first
    pub async fn browse(&self, filter: &CatalogueFilter) -> Result<Vec<Product>> {
        let products = self.get_all().await?;
        Ok(products.into_iter().filter(|p| filter.matches(p)).collect())
    }

    /// Totals for the admin dashboard, read from a single listing
    pub async fn summary(&self, recent: usize) -> Result<CatalogueSummary> {
        let products = self.get_all().await?;
        Ok(CatalogueSummary::from_products(products, recent))
    }
}
