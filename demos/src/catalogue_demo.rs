use std::env;
use std::sync::Arc;

use dotenv::dotenv;
use jewellery_catalogue::auth::LocalIdentity;
use jewellery_catalogue::identifier::PRODUCT_ID_FIELD;
use jewellery_catalogue::prelude::*;
use jewellery_catalogue::storage::InMemoryObjects;
use jewellery_catalogue::store::{DocumentStore, InMemoryStore};

/// Catalogue over in-memory backends with a signed-in admin
async fn local_catalogue() -> Result<(Catalogue, SessionContext)> {
    let options = ClientOptions::default();
    let store = Arc::new(InMemoryStore::new().with_unique(&options.products_table, PRODUCT_ID_FIELD));
    let users_table = options.users_table.clone();
    let catalogue = Catalogue::with_backends(
        store.clone(),
        Arc::new(InMemoryObjects::new()),
        Arc::new(LocalIdentity::new()),
        options,
    );

    let context = catalogue.accounts().register("admin@example.com", "demo-password").await?;
    let mut promote = jewellery_catalogue::store::Document::new();
    promote.insert("role".into(), Role::Admin.as_str().into());
    store.update(&users_table, context.uid(), promote, &[]).await?;

    let context = catalogue
        .accounts()
        .resolve(Some(context.principal))
        .await?
        .ok_or_else(|| Error::auth("no session"))?;
    Ok((catalogue, context))
}

/// Catalogue against the configured project, signed in with DEMO_EMAIL
async fn hosted_catalogue(config: CatalogueConfig) -> Result<(Catalogue, SessionContext)> {
    let catalogue = Catalogue::connect(&config, ClientOptions::default())?;
    let email = env::var("DEMO_EMAIL").map_err(|_| Error::config("DEMO_EMAIL must be set"))?;
    let password = env::var("DEMO_PASSWORD").map_err(|_| Error::config("DEMO_PASSWORD must be set"))?;
    let context = catalogue.accounts().login(&email, &password).await?;
    Ok((catalogue, context))
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    pretty_env_logger::init();

    let (catalogue, context) = match CatalogueConfig::from_env() {
        Ok(config) => {
            log::info!("using hosted backend at {}", config.url);
            hosted_catalogue(config).await?
        }
        Err(_) => {
            log::info!("SUPABASE_URL not set, using in-memory backends");
            local_catalogue().await?
        }
    };
    println!("Signed in as {} ({})", context.uid(), context.role);

    if context.require_admin().is_ok() {
        let images = catalogue
            .images()
            .upload_all(
                &[
                    ImageFile::new("front.jpg", vec![0xFF, 0xD8, 0xFF]),
                    ImageFile::new("side.png", vec![0x89, 0x50, 0x4E, 0x47]),
                ],
                "demo",
                0,
            )
            .await?;
        let draft = ProductDraft::new("Royal Kundan Necklace")
            .with_category(Category::Necklaces)
            .with_material("Gold")
            .with_purity("22K")
            .with_weight("45g")
            .with_stone("Kundan")
            .with_gallery(Gallery::arrange(Vec::new(), images));
        let created = catalogue.products().create(&draft).await?;
        println!("Created {} with product id {}", created.id, created.product_id);
    }

    println!("\nFeatured:");
    let featured = catalogue.products().get_featured_default().await?;
    for product in &featured {
        println!(
            "  {} {} [{}]",
            product.product_id,
            product.name,
            product.category.as_ref().map(|c| c.as_str()).unwrap_or("-")
        );
    }

    if let Some(product) = featured.first() {
        let outcome = catalogue.favorites().toggle(context.uid(), &product.id).await?;
        println!("\nToggled favorite on {}: {:?}", product.name, outcome);
        let favorites = catalogue.favorites().favorite_products(context.uid()).await?;
        println!("Favorites: {}", favorites.len());
    }

    catalogue.accounts().logout().await?;
    Ok(())
}
