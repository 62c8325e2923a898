//! Integration tests for the photo-server registry:
//! - Upsert keyed by update URL
//! - The `unreachable` breaker and reachable listing

use chrono::Utc;
use lightbox_db::models::photo_server::{PhotoServer, RegisterPhotoServer};
use lightbox_db::repositories::photo_server_repo::PhotoServerRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn register(pool: &PgPool, subdomain: &str, url: &str, key: &str) -> PhotoServer {
    let mut tx = pool.begin().await.unwrap();
    let server = PhotoServerRepo::upsert(
        &mut tx,
        &RegisterPhotoServer {
            subdomain: subdomain.to_string(),
            photos_update_url: url.to_string(),
            auth_key: key.to_string(),
        },
        Utc::now(),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    server
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upsert_is_keyed_by_update_url(pool: PgPool) {
    let first = register(&pool, "photos01", "http://a.example/update", "key-1").await;
    assert!(!first.unreachable);

    // Same URL: the registration is refreshed in place.
    let refreshed = register(&pool, "photos02", "http://a.example/update", "key-2").await;
    assert_eq!(refreshed.id, first.id);
    assert_eq!(refreshed.subdomain, "photos02");
    assert_eq!(refreshed.auth_key, "key-2");

    // Different URL: a second server.
    let second = register(&pool, "photos01", "http://b.example/update", "key-3").await;
    assert_ne!(second.id, first.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_breaker_trips_once_and_hides_the_server(pool: PgPool) {
    let server = register(&pool, "photos01", "http://a.example/update", "key").await;

    assert!(PhotoServerRepo::mark_unreachable(&pool, server.id).await.unwrap());
    // Already tripped: nothing changes.
    assert!(!PhotoServerRepo::mark_unreachable(&pool, server.id).await.unwrap());

    assert!(PhotoServerRepo::list_reachable(&pool, "photos01").await.unwrap().is_empty());
    let row = PhotoServerRepo::find_by_url(&pool, "http://a.example/update")
        .await
        .unwrap()
        .unwrap();
    assert!(row.unreachable);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reregistration_clears_the_breaker(pool: PgPool) {
    let server = register(&pool, "photos01", "http://a.example/update", "key").await;
    PhotoServerRepo::mark_unreachable(&pool, server.id).await.unwrap();

    let refreshed = register(&pool, "photos01", "http://a.example/update", "key").await;
    assert_eq!(refreshed.id, server.id);
    assert!(!refreshed.unreachable);

    let reachable = PhotoServerRepo::list_reachable(&pool, "photos01").await.unwrap();
    assert_eq!(reachable.len(), 1);
    assert_eq!(reachable[0].id, server.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_reachable_filters_by_shard(pool: PgPool) {
    register(&pool, "photos01", "http://a.example/update", "key").await;
    register(&pool, "photos01", "http://b.example/update", "key").await;
    register(&pool, "photos02", "http://c.example/update", "key").await;

    assert_eq!(PhotoServerRepo::list_reachable(&pool, "photos01").await.unwrap().len(), 2);
    assert_eq!(PhotoServerRepo::list_reachable(&pool, "photos02").await.unwrap().len(), 1);
    assert!(PhotoServerRepo::list_reachable(&pool, "photos03").await.unwrap().is_empty());
}
