//! Integration tests for the SurrealDB credential store, using the
//! in-memory engine.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

use washbook_core::error::WashbookError;
use washbook_core::models::principal::{
    CreatePrincipal, Provider, ResetWindow, Role, UpdatePrincipal,
};
use washbook_core::store::{CredentialStore, Pagination};
use washbook_db::{SurrealCredentialStore, run_migrations};

async fn setup() -> SurrealCredentialStore<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    run_migrations(&db).await.unwrap();
    SurrealCredentialStore::new(db)
}

fn local_principal(email: &str) -> CreatePrincipal {
    CreatePrincipal {
        preferred_name: "Thandi".into(),
        email: email.into(),
        phone: Some("+27821234567".into()),
        address: Some("12 Main Rd, Cape Town".into()),
        social_media_handles: vec!["@thandi".into()],
        provider: Provider::Local,
        role: Role::User,
        password_hash: Some("$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".into()),
        social_login_id: None,
    }
}

#[tokio::test]
async fn create_then_get_roundtrip() {
    let store = setup().await;

    let created = store.create(local_principal("a@example.com")).await.unwrap();
    assert!(created.active);
    assert_eq!(created.role, Role::User);
    assert!(created.password_reset_digest.is_none());

    let by_id = store.get_by_id(created.id).await.unwrap();
    assert_eq!(by_id.email, "a@example.com");
    assert_eq!(by_id.social_media_handles, vec!["@thandi".to_string()]);

    let by_email = store.get_by_email("a@example.com").await.unwrap();
    assert_eq!(by_email.id, created.id);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let store = setup().await;

    store.create(local_principal("dup@example.com")).await.unwrap();
    let err = store
        .create(local_principal("dup@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, WashbookError::AlreadyExists { .. }));
    assert_eq!(err.status_code(), 409);
}

#[tokio::test]
async fn deactivated_principal_is_invisible_to_lookups() {
    let store = setup().await;

    let created = store.create(local_principal("gone@example.com")).await.unwrap();
    store.deactivate(created.id).await.unwrap();

    assert!(matches!(
        store.get_by_id(created.id).await.unwrap_err(),
        WashbookError::NotFound { .. }
    ));
    assert!(matches!(
        store.get_by_email("gone@example.com").await.unwrap_err(),
        WashbookError::NotFound { .. }
    ));

    // Still present in the admin listing.
    let page = store.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert!(!page.items[0].active);
}

#[tokio::test]
async fn reset_digest_lookup_matches_only_unexpired_windows() {
    let store = setup().await;
    let created = store.create(local_principal("reset@example.com")).await.unwrap();

    store
        .update(
            created.id,
            UpdatePrincipal {
                reset_window: Some(Some(ResetWindow {
                    digest: "abc123".into(),
                    expires_at: Utc::now() + Duration::minutes(10),
                })),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let found = store.get_by_reset_digest("abc123").await.unwrap();
    assert_eq!(found.id, created.id);

    // Expire the window: same digest no longer matches.
    store
        .update(
            created.id,
            UpdatePrincipal {
                reset_window: Some(Some(ResetWindow {
                    digest: "abc123".into(),
                    expires_at: Utc::now() - Duration::minutes(1),
                })),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        store.get_by_reset_digest("abc123").await.unwrap_err(),
        WashbookError::NotFound { .. }
    ));
}

#[tokio::test]
async fn clearing_the_reset_window_removes_both_fields() {
    let store = setup().await;
    let created = store.create(local_principal("clear@example.com")).await.unwrap();

    store
        .update(
            created.id,
            UpdatePrincipal {
                reset_window: Some(Some(ResetWindow {
                    digest: "to-clear".into(),
                    expires_at: Utc::now() + Duration::minutes(10),
                })),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let cleared = store
        .update(
            created.id,
            UpdatePrincipal {
                reset_window: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(cleared.password_reset_digest.is_none());
    assert!(cleared.password_reset_expires_at.is_none());
    assert!(matches!(
        store.get_by_reset_digest("to-clear").await.unwrap_err(),
        WashbookError::NotFound { .. }
    ));
}

#[tokio::test]
async fn update_changes_only_named_fields() {
    let store = setup().await;
    let created = store.create(local_principal("patch@example.com")).await.unwrap();

    let updated = store
        .update(
            created.id,
            UpdatePrincipal {
                preferred_name: Some("Thandiwe".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.preferred_name, "Thandiwe");
    assert_eq!(updated.email, "patch@example.com");
    assert_eq!(updated.password_hash, created.password_hash);
}

#[tokio::test]
async fn hard_delete_is_terminal() {
    let store = setup().await;
    let created = store.create(local_principal("del@example.com")).await.unwrap();

    store.delete(created.id).await.unwrap();

    assert!(matches!(
        store.get_by_id(created.id).await.unwrap_err(),
        WashbookError::NotFound { .. }
    ));
    let page = store.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn list_paginates_in_creation_order() {
    let store = setup().await;
    for i in 0..5 {
        store
            .create(local_principal(&format!("p{i}@example.com")))
            .await
            .unwrap();
    }

    let page = store
        .list(Pagination {
            offset: 2,
            limit: 2,
        })
        .await
        .unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.offset, 2);
}

#[tokio::test]
async fn federated_principal_has_no_password_hash() {
    let store = setup().await;

    let created = store
        .create(CreatePrincipal {
            preferred_name: "Sipho".into(),
            email: "sipho@example.com".into(),
            phone: None,
            address: None,
            social_media_handles: vec![],
            provider: Provider::Google,
            role: Role::User,
            password_hash: None,
            social_login_id: Some("google-oauth2|12345".into()),
        })
        .await
        .unwrap();

    assert_eq!(created.provider, Provider::Google);
    assert!(created.password_hash.is_none());
    assert_eq!(created.social_login_id.as_deref(), Some("google-oauth2|12345"));
}

#[tokio::test]
async fn deactivate_and_delete_report_unknown_ids() {
    let store = setup().await;
    let ghost = uuid::Uuid::new_v4();

    assert!(matches!(
        store.deactivate(ghost).await.unwrap_err(),
        WashbookError::NotFound { .. }
    ));
    assert!(matches!(
        store.delete(ghost).await.unwrap_err(),
        WashbookError::NotFound { .. }
    ));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    run_migrations(&db).await.unwrap();
    run_migrations(&db).await.unwrap();
}
