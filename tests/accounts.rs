use std::sync::Arc;

use jewellery_catalogue::auth::{LocalIdentity, Principal};
use jewellery_catalogue::prelude::*;
use jewellery_catalogue::storage::InMemoryObjects;
use jewellery_catalogue::store::{Document, DocumentStore, InMemoryStore};

struct Harness {
    catalogue: Catalogue,
    store: Arc<InMemoryStore>,
    identity: Arc<LocalIdentity>,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let identity = Arc::new(LocalIdentity::new());
    let catalogue = Catalogue::with_backends(
        store.clone(),
        Arc::new(InMemoryObjects::new()),
        identity.clone(),
        ClientOptions::default(),
    );
    Harness {
        catalogue,
        store,
        identity,
    }
}

async fn promote(store: &InMemoryStore, uid: &str) {
    let mut patch = Document::new();
    patch.insert("role".into(), "admin".into());
    store.update("users", uid, patch, &[]).await.unwrap();
}

#[tokio::test]
async fn register_bootstraps_a_plain_user() {
    let h = harness();
    let context = h
        .catalogue
        .accounts()
        .register("meera@example.com", "secret")
        .await
        .unwrap();

    assert_eq!(context.role, Role::User);
    assert!(!context.is_admin());
    assert!(matches!(context.require_admin(), Err(Error::Forbidden(_))));

    let profile = h.catalogue.users().get(context.uid()).await.unwrap().unwrap();
    assert_eq!(profile.email.as_deref(), Some("meera@example.com"));
    assert_eq!(profile.role, Role::User);
    assert!(profile.favorites.is_empty());
    assert!(profile.created_at.is_some());
}

#[tokio::test]
async fn bootstrap_is_idempotent() {
    let h = harness();
    let principal = Principal {
        uid: "u1".into(),
        email: Some("u1@example.com".into()),
    };
    let users = h.catalogue.users();

    assert!(users.ensure(&principal).await.unwrap());
    let first = users.get("u1").await.unwrap().unwrap();

    h.catalogue
        .products()
        .create(&ProductDraft::new("Jhumka"))
        .await
        .unwrap();
    let product = h.catalogue.products().get_all().await.unwrap().remove(0);
    h.catalogue.favorites().toggle("u1", &product.id).await.unwrap();

    assert!(!users.ensure(&principal).await.unwrap());
    let second = users.get("u1").await.unwrap().unwrap();
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.favorites, vec![product.id]);
    assert_eq!(h.store.len("users"), 1);
}

#[tokio::test]
async fn login_keeps_the_stored_admin_role() {
    let h = harness();
    let accounts = h.catalogue.accounts();
    let context = accounts.register("owner@example.com", "secret").await.unwrap();
    accounts.logout().await.unwrap();
    promote(&h.store, context.uid()).await;

    let context = accounts.login("owner@example.com", "secret").await.unwrap();
    assert!(context.is_admin());
    assert!(context.require_admin().is_ok());
}

#[tokio::test]
async fn wrong_password_is_an_auth_error() {
    let h = harness();
    let accounts = h.catalogue.accounts();
    accounts.register("meera@example.com", "secret").await.unwrap();

    let err = accounts.login("meera@example.com", "nope").await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
}

#[tokio::test]
async fn restore_accepts_live_sessions_and_rejects_expired_ones() {
    let h = harness();
    let principal = Principal {
        uid: "returning".into(),
        email: Some("returning@example.com".into()),
    };

    let live = h.identity.issue(&principal, 600).unwrap();
    let context = h.catalogue.accounts().restore(&live).await.unwrap();
    assert_eq!(context.principal, principal);
    assert!(h.catalogue.users().get("returning").await.unwrap().is_some());

    let expired = h.identity.issue(&principal, -60).unwrap();
    let err = h.catalogue.accounts().restore(&expired).await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
}

#[tokio::test]
async fn subscribers_observe_sign_in_and_out() {
    let h = harness();
    let accounts = h.catalogue.accounts();
    let mut changes = accounts.identity().subscribe();
    assert!(changes.borrow().is_none());

    let context = accounts.register("meera@example.com", "secret").await.unwrap();
    changes.changed().await.unwrap();
    let observed = changes.borrow_and_update().clone();
    assert_eq!(observed.as_ref(), Some(&context.principal));

    let resolved = accounts.resolve(observed).await.unwrap().unwrap();
    assert_eq!(resolved, context);
    assert_eq!(accounts.current().await.unwrap(), Some(context));

    accounts.logout().await.unwrap();
    changes.changed().await.unwrap();
    assert!(changes.borrow().is_none());
    assert!(accounts.resolve(None).await.unwrap().is_none());
    assert!(accounts.current().await.unwrap().is_none());
}

#[tokio::test]
async fn restore_refuses_a_token_from_another_secret() {
    let h = harness();
    let accounts = h.catalogue.accounts();
    let owner = accounts.register("owner@example.com", "secret").await.unwrap();
    accounts.logout().await.unwrap();
    promote(&h.store, owner.uid()).await;

    let forged = LocalIdentity::with_secret(b"someone-else")
        .issue(&owner.principal, 600)
        .unwrap();
    let err = accounts.restore(&forged).await.unwrap_err();
    assert!(matches!(err, Error::Jwt(_)));
    assert!(accounts.current().await.unwrap().is_none());
}
