use jewellery_catalogue::prelude::*;

fn catalogue() -> Catalogue {
    Catalogue::in_memory(ClientOptions::default())
}

async fn seed(repo: &ProductRepository, names: &[(&str, Category)]) -> Vec<CreatedProduct> {
    let mut created = Vec::new();
    for (name, category) in names {
        let draft = ProductDraft::new(name).with_category(category.clone());
        created.push(repo.create(&draft).await.unwrap());
    }
    created
}

#[tokio::test]
async fn royal_kundan_necklace_scenario() {
    let catalogue = catalogue();
    let repo = catalogue.products();

    let draft = ProductDraft::new("Royal Kundan Necklace")
        .with_category(Category::Necklaces)
        .with_material("Gold")
        .with_purity("22K")
        .with_weight("45g");
    let created = repo.create(&draft).await.unwrap();

    assert_eq!(created.product_id.len(), 5);
    assert!(created
        .product_id
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    let by_lower = repo
        .search_by_external_id(&created.product_id.to_lowercase())
        .await
        .unwrap();
    assert_eq!(by_lower.len(), 1);
    assert_eq!(by_lower[0].name, "Royal Kundan Necklace");
    assert_eq!(by_lower[0].id, created.id);

    let necklaces = repo.get_by_category(&Category::Necklaces).await.unwrap();
    assert!(necklaces.iter().any(|p| p.id == created.id));
}

#[tokio::test]
async fn created_products_read_back_unchanged() {
    let catalogue = catalogue();
    let repo = catalogue.products();

    let draft = ProductDraft::new("Temple Jhumka")
        .with_category(Category::Earrings)
        .with_description("Antique finish")
        .with_material("Silver")
        .with_weight("18g")
        .with_purity("925")
        .with_stone("Ruby")
        .with_gallery(Gallery::arrange(
            Vec::new(),
            vec!["u://a".into(), "u://b".into(), "u://c".into()],
        ));
    let created = repo.create(&draft).await.unwrap();

    let product = repo.get_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(product.product_id, created.product_id);
    assert_eq!(product.name, draft.name);
    assert_eq!(product.category, draft.category);
    assert_eq!(product.description, draft.description);
    assert_eq!(product.material, draft.material);
    assert_eq!(product.weight, draft.weight);
    assert_eq!(product.purity, draft.purity);
    assert_eq!(product.stone, draft.stone);
    assert_eq!(product.main_image.as_deref(), Some("u://a"));
    assert_eq!(product.images, vec!["u://b", "u://c"]);
    assert_eq!(product.created_at, product.updated_at);
}

#[tokio::test]
async fn get_all_is_newest_first_and_featured_is_a_prefix() {
    let catalogue = catalogue();
    let repo = catalogue.products();
    seed(
        repo,
        &[
            ("A", Category::Rings),
            ("B", Category::Rings),
            ("C", Category::Sets),
            ("D", Category::Pendants),
        ],
    )
    .await;

    let all = repo.get_all().await.unwrap();
    assert_eq!(all.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), ["D", "C", "B", "A"]);
    for pair in all.windows(2) {
        assert!(pair[0].created_at > pair[1].created_at);
    }

    let featured = repo.get_featured(3).await.unwrap();
    assert_eq!(featured, all[..3].to_vec());

    let more_than_stored = repo.get_featured(10).await.unwrap();
    assert_eq!(more_than_stored.len(), 4);

    let default = repo.get_featured_default().await.unwrap();
    assert_eq!(default.len(), 4);
}

#[tokio::test]
async fn featured_default_honors_the_configured_count() {
    let catalogue = Catalogue::in_memory(ClientOptions::default().with_featured_count(2));
    let repo = catalogue.products();
    seed(repo, &[("A", Category::Rings), ("B", Category::Rings), ("C", Category::Rings)]).await;

    let featured = repo.get_featured_default().await.unwrap();
    assert_eq!(featured.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), ["C", "B"]);
}

#[tokio::test]
async fn category_filter_returns_exactly_that_category() {
    let catalogue = catalogue();
    let repo = catalogue.products();
    seed(
        repo,
        &[
            ("Solitaire", Category::Rings),
            ("Choker", Category::Necklaces),
            ("Band", Category::Rings),
            ("Anklet", Category::Custom("Anklets".into())),
        ],
    )
    .await;

    let rings = repo.get_by_category(&Category::Rings).await.unwrap();
    assert_eq!(rings.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), ["Band", "Solitaire"]);
    assert!(rings.iter().all(|p| p.category == Some(Category::Rings)));

    let anklets = repo.get_by_category(&Category::from("Anklets")).await.unwrap();
    assert_eq!(anklets.len(), 1);

    assert!(repo.get_by_category(&Category::Bracelets).await.unwrap().is_empty());
}

#[tokio::test]
async fn external_id_lookup_ignores_case_and_whitespace() {
    let catalogue = catalogue();
    let repo = catalogue.products();
    let created = seed(repo, &[("Kada", Category::Bracelets)]).await.remove(0);

    let padded = format!("  {}  ", created.product_id.to_lowercase());
    let found = repo.search_by_external_id(&padded).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, created.id);

    assert!(repo.search_by_external_id("NOPE1").await.unwrap().is_empty());
}

#[tokio::test]
async fn update_merges_and_refreshes_updated_at() {
    let catalogue = catalogue();
    let repo = catalogue.products();
    let created = seed(repo, &[("Stud", Category::Earrings)]).await.remove(0);
    let before = repo.get_by_id(&created.id).await.unwrap().unwrap();

    let updated = repo
        .update(&created.id, &ProductPatch::new().weight("4g").stone("Diamond"))
        .await
        .unwrap();

    assert_eq!(updated.name, "Stud");
    assert_eq!(updated.weight.as_deref(), Some("4g"));
    assert_eq!(updated.stone.as_deref(), Some("Diamond"));
    assert_eq!(updated.product_id, before.product_id);
    assert_eq!(updated.created_at, before.created_at);
    assert!(updated.updated_at > before.updated_at);
}

#[tokio::test]
async fn missing_products_are_reported() {
    let catalogue = catalogue();
    let repo = catalogue.products();

    assert!(repo.get_by_id("missing").await.unwrap().is_none());

    let update = repo.update("missing", &ProductPatch::new().name("X")).await;
    assert!(matches!(update, Err(Error::NotFound { .. })));

    let delete = repo.delete("missing").await;
    assert!(matches!(delete, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn deleted_products_disappear() {
    let catalogue = catalogue();
    let repo = catalogue.products();
    let created = seed(repo, &[("Nath", Category::Other), ("Tikka", Category::Other)]).await;

    repo.delete(&created[0].id).await.unwrap();

    assert!(repo.get_by_id(&created[0].id).await.unwrap().is_none());
    let remaining = repo.get_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, created[1].id);
}

#[tokio::test]
async fn browse_combines_category_and_search() {
    let catalogue = catalogue();
    let repo = catalogue.products();
    let draft = ProductDraft::new("Polki Choker")
        .with_category(Category::Necklaces)
        .with_description("Uncut diamonds");
    repo.create(&draft).await.unwrap();
    seed(repo, &[("Gold Chain", Category::Necklaces), ("Diamond Ring", Category::Rings)]).await;

    let diamonds = repo.browse(&CatalogueFilter::new().search("DIAMOND")).await.unwrap();
    assert_eq!(
        diamonds.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        ["Diamond Ring", "Polki Choker"]
    );

    let necklace_diamonds = repo
        .browse(&CatalogueFilter::new().category(Category::Necklaces).search("diamond"))
        .await
        .unwrap();
    assert_eq!(necklace_diamonds.len(), 1);
    assert_eq!(necklace_diamonds[0].name, "Polki Choker");

    assert_eq!(repo.browse(&CatalogueFilter::new()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn summary_counts_categories_largest_first() {
    let catalogue = catalogue();
    let repo = catalogue.products();

    let empty = repo.summary(5).await.unwrap();
    assert_eq!(empty.total, 0);
    assert!(empty.by_category.is_empty());
    assert!(empty.recent.is_empty());

    seed(
        repo,
        &[
            ("Temple Ring", Category::Rings),
            ("Polki Choker", Category::Necklaces),
            ("Solitaire", Category::Rings),
            ("Kada", Category::Bracelets),
            ("Band", Category::Rings),
            ("Rani Haar", Category::Necklaces),
            ("Loose Pearls", Category::Custom(String::new())),
        ],
    )
    .await;
    repo.create(&ProductDraft::new("Gift Card")).await.unwrap();

    let summary = repo.summary(3).await.unwrap();
    assert_eq!(summary.total, 8);
    assert_eq!(
        summary.by_category,
        vec![
            ("Rings".to_string(), 3),
            ("Necklaces".to_string(), 2),
            ("Uncategorized".to_string(), 2),
            ("Bracelets".to_string(), 1),
        ]
    );
    assert_eq!(
        summary.recent.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        ["Gift Card", "Loose Pearls", "Rani Haar"]
    );
}
