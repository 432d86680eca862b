use jewellery_catalogue::auth::Principal;
use jewellery_catalogue::prelude::*;

fn principal(uid: &str) -> Principal {
    Principal {
        uid: uid.to_string(),
        email: Some(format!("{}@example.com", uid)),
    }
}

async fn setup() -> (Catalogue, String) {
    let catalogue = Catalogue::in_memory(ClientOptions::default());
    catalogue.users().ensure(&principal("u1")).await.unwrap();
    let created = catalogue
        .products()
        .create(&ProductDraft::new("Maang Tikka").with_category(Category::Other))
        .await
        .unwrap();
    (catalogue, created.id)
}

#[tokio::test]
async fn toggle_twice_restores_the_original_set() {
    let (catalogue, product) = setup().await;
    let favorites = catalogue.favorites();

    assert!(favorites.list("u1").await.unwrap().is_empty());

    assert_eq!(favorites.toggle("u1", &product).await.unwrap(), ToggleOutcome::Added);
    assert_eq!(favorites.list("u1").await.unwrap(), vec![product.clone()]);
    assert!(favorites.contains("u1", &product).await.unwrap());

    assert_eq!(favorites.toggle("u1", &product).await.unwrap(), ToggleOutcome::Removed);
    assert!(favorites.list("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn toggle_without_a_user_document_fails() {
    let (catalogue, product) = setup().await;

    let err = catalogue.favorites().toggle("ghost", &product).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(catalogue.users().get("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn list_is_empty_for_unknown_users() {
    let (catalogue, _) = setup().await;
    assert!(catalogue.favorites().list("ghost").await.unwrap().is_empty());
}

#[tokio::test]
async fn favorite_products_skips_deleted_products() {
    let (catalogue, first) = setup().await;
    let second = catalogue
        .products()
        .create(&ProductDraft::new("Haath Phool"))
        .await
        .unwrap()
        .id;

    let favorites = catalogue.favorites();
    favorites.toggle("u1", &first).await.unwrap();
    favorites.toggle("u1", &second).await.unwrap();
    catalogue.products().delete(&first).await.unwrap();

    let products = favorites.favorite_products("u1").await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Haath Phool");
    assert_eq!(favorites.list("u1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn concurrent_adds_never_duplicate() {
    let (catalogue, product) = setup().await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let favorites = catalogue.favorites().clone();
        let product = product.clone();
        tasks.push(tokio::spawn(async move { favorites.toggle("u1", &product).await }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let list = catalogue.favorites().list("u1").await.unwrap();
    assert!(list.len() <= 1);
    assert!(list.iter().all(|id| id == &product));
}

#[tokio::test]
async fn view_state_tracks_a_toggle_round_trip() {
    let (catalogue, product) = setup().await;
    let favorites = catalogue.favorites();

    let mut state = FavoriteState::from_favorites(&favorites.list("u1").await.unwrap(), &product);
    assert!(!state.displayed());

    assert!(state.begin_toggle());
    assert!(state.displayed());
    let outcome = favorites.toggle("u1", &product).await.unwrap();
    state.settle(outcome);

    assert!(state.displayed());
    assert_eq!(
        state,
        FavoriteState::from_favorites(&favorites.list("u1").await.unwrap(), &product)
    );
}
