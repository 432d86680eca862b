//! Per-user favorites

use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::product::{Product, ProductRepository};
use crate::store::DocumentStore;

const FAVORITES_FIELD: &str = "favorites";

/// What a toggle did to the favorites set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

impl ToggleOutcome {
    /// Membership after the toggle
    pub fn is_favorite(&self) -> bool {
        matches!(self, ToggleOutcome::Added)
    }
}

/// Favorites set stored on the user document.
///
/// Membership changes go through the store's atomic array operations, so two
/// toggles racing on the same product cannot leave a duplicate entry.
#[derive(Clone)]
pub struct Favorites {
    store: Arc<dyn DocumentStore>,
    users_table: String,
    products: ProductRepository,
}

impl Favorites {
    pub fn new(store: Arc<dyn DocumentStore>, users_table: &str, products: ProductRepository) -> Self {
        Self {
            store,
            users_table: users_table.to_string(),
            products,
        }
    }

    async fn read(&self, uid: &str) -> Result<Option<Vec<String>>> {
        let Some(record) = self.store.get(&self.users_table, uid).await? else {
            return Ok(None);
        };
        let favorites = match record.field(FAVORITES_FIELD) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        Ok(Some(favorites))
    }

    /// Flip membership of `product_id` in the user's favorites.
    ///
    /// Fails with [`Error::NotFound`] when the user document does not exist.
    pub async fn toggle(&self, uid: &str, product_id: &str) -> Result<ToggleOutcome> {
        let favorites = self
            .read(uid)
            .await?
            .ok_or_else(|| Error::not_found(&self.users_table, uid))?;

        let value = Value::String(product_id.to_string());
        if favorites.iter().any(|id| id == product_id) {
            self.store
                .array_remove(&self.users_table, uid, FAVORITES_FIELD, value)
                .await?;
            Ok(ToggleOutcome::Removed)
        } else {
            self.store
                .array_union(&self.users_table, uid, FAVORITES_FIELD, value)
                .await?;
            Ok(ToggleOutcome::Added)
        }
    }

    /// Product keys the user marked; empty when the user document is absent
    pub async fn list(&self, uid: &str) -> Result<Vec<String>> {
        Ok(self.read(uid).await?.unwrap_or_default())
    }

    /// Whether `product_id` is among the user's favorites
    pub async fn contains(&self, uid: &str, product_id: &str) -> Result<bool> {
        Ok(self.list(uid).await?.iter().any(|id| id == product_id))
    }

    /// The user's favorite products, skipping ones that no longer exist
    pub async fn favorite_products(&self, uid: &str) -> Result<Vec<Product>> {
        let mut products = Vec::new();
        for id in self.list(uid).await? {
            if let Some(product) = self.products.get_by_id(&id).await? {
                products.push(product);
            }
        }
        Ok(products)
    }
}

/// Favorite indicator for one product: the membership last fetched from the
/// store plus an in-flight toggle, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FavoriteState {
    confirmed: bool,
    pending: bool,
}

impl FavoriteState {
    /// State derived from a fetched favorites list
    pub fn from_favorites(favorites: &[String], product_id: &str) -> Self {
        Self {
            confirmed: favorites.iter().any(|id| id == product_id),
            pending: false,
        }
    }

    /// Membership as the store last reported it
    pub fn confirmed(&self) -> bool {
        self.confirmed
    }

    /// Whether a toggle is awaiting its result
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Membership to show: the expected result while a toggle is in flight
    pub fn displayed(&self) -> bool {
        self.confirmed != self.pending
    }

    /// Record a toggle request. Returns `false` when one is already in flight.
    pub fn begin_toggle(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    /// Apply the store's answer to the in-flight toggle
    pub fn settle(&mut self, outcome: ToggleOutcome) {
        self.confirmed = outcome.is_favorite();
        self.pending = false;
    }

    /// Drop the in-flight toggle after a failed write
    pub fn fail(&mut self) {
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_toggle_shows_the_expected_state() {
        let mut state = FavoriteState::from_favorites(&["p1".to_string()], "p2");
        assert!(!state.displayed());

        assert!(state.begin_toggle());
        assert!(state.displayed());
        assert!(!state.confirmed());
        assert!(!state.begin_toggle());

        state.settle(ToggleOutcome::Added);
        assert!(state.displayed());
        assert!(state.confirmed());
        assert!(!state.is_pending());
    }

    #[test]
    fn failed_toggle_reverts_to_confirmed() {
        let mut state = FavoriteState::from_favorites(&["p1".to_string()], "p1");
        state.begin_toggle();
        assert!(!state.displayed());
        state.fail();
        assert!(state.displayed());
    }
}
