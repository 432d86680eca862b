//! Jewellery catalogue core
//!
//! Product catalogue, product images, per-user favorites and account
//! bootstrap for a storefront running on a hosted Postgres/storage/auth
//! backend. Every backend sits behind a trait with an HTTP implementation
//! and an in-memory one for tests and local development.

pub mod account;
pub mod auth;
pub mod config;
pub mod error;
pub mod favorites;
pub mod fetch;
pub mod identifier;
pub mod images;
pub mod postgrest;
pub mod product;
pub mod storage;
pub mod store;
pub mod user;

use std::sync::Arc;

use crate::account::AccountService;
use crate::auth::{AuthClient, IdentityProvider, LocalIdentity};
use crate::config::{CatalogueConfig, ClientOptions};
use crate::error::Result;
use crate::favorites::Favorites;
use crate::fetch::{BearerToken, Transport};
use crate::identifier::PRODUCT_ID_FIELD;
use crate::images::ImageUploader;
use crate::postgrest::PostgrestStore;
use crate::product::ProductRepository;
use crate::storage::{InMemoryObjects, ObjectStore, SupabaseBucket};
use crate::store::{DocumentStore, InMemoryStore};
use crate::user::UserDirectory;

/// The main entry point: backends wired into the catalogue services
#[derive(Clone)]
pub struct Catalogue {
    products: ProductRepository,
    favorites: Favorites,
    users: UserDirectory,
    images: ImageUploader,
    accounts: AccountService,
    options: ClientOptions,
}

impl Catalogue {
    /// Connect to the hosted backend
    ///
    /// # Example
    ///
    /// ```no_run
    /// use jewellery_catalogue::{config::{CatalogueConfig, ClientOptions}, Catalogue};
    ///
    /// # fn main() -> jewellery_catalogue::error::Result<()> {
    /// let config = CatalogueConfig::new("https://your-project.supabase.co", "your-anon-key".into())?;
    /// let catalogue = Catalogue::connect(&config, ClientOptions::default())?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn connect(config: &CatalogueConfig, options: ClientOptions) -> Result<Self> {
        let transport = Transport::new(config, &options, BearerToken::new())?;
        let store = Arc::new(PostgrestStore::new(transport.clone()));
        let objects = Arc::new(SupabaseBucket::new(transport.clone(), &options.images_bucket));
        let identity = Arc::new(AuthClient::new(transport));
        Ok(Self::with_backends(store, objects, identity, options))
    }

    /// Catalogue over fresh in-memory backends
    pub fn in_memory(options: ClientOptions) -> Self {
        let store = InMemoryStore::new().with_unique(&options.products_table, PRODUCT_ID_FIELD);
        Self::with_backends(
            Arc::new(store),
            Arc::new(InMemoryObjects::new()),
            Arc::new(LocalIdentity::new()),
            options,
        )
    }

    /// Catalogue over caller-supplied backends
    pub fn with_backends(
        store: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        identity: Arc<dyn IdentityProvider>,
        options: ClientOptions,
    ) -> Self {
        let products = ProductRepository::new(
            store.clone(),
            &options.products_table,
            options.id_policy,
            options.featured_count,
        );
        let users = UserDirectory::new(store.clone(), &options.users_table);
        let favorites = Favorites::new(store, &options.users_table, products.clone());

        Self {
            images: ImageUploader::new(objects),
            accounts: AccountService::new(identity, users.clone()),
            products,
            favorites,
            users,
            options,
        }
    }

    pub fn products(&self) -> &ProductRepository {
        &self.products
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    pub fn images(&self) -> &ImageUploader {
        &self.images
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}

/// Commonly used types
pub mod prelude {
    pub use crate::account::{AccountService, SessionContext};
    pub use crate::auth::{IdentityProvider, Principal, Session};
    pub use crate::config::{CatalogueConfig, ClientOptions};
    pub use crate::error::{Error, Result};
    pub use crate::favorites::{FavoriteState, Favorites, ToggleOutcome};
    pub use crate::identifier::IdPolicy;
    pub use crate::images::{Gallery, ImageFile, ImageUploader};
    pub use crate::product::{
        CatalogueFilter, CatalogueSummary, Category, CreatedProduct, Product, ProductDraft, ProductPatch,
        ProductRepository,
    };
    pub use crate::user::{Role, UserProfile};
    pub use crate::Catalogue;
}
