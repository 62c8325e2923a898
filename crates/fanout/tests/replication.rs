//! Integration tests for photo-server fan-out:
//! - Delivery to every reachable server on a shard
//! - The unreachable breaker after exhausted retries
//! - Registration with full-shard resync, including rollback on failure

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Utc;
use lightbox_core::ids;
use lightbox_core::types::DbId;
use lightbox_db::models::album::CreateAlbum;
use lightbox_db::models::photo::CreatePhoto;
use lightbox_db::models::photo_server::{PhotoServer, RegisterPhotoServer};
use lightbox_db::models::user::CreateUser;
use lightbox_db::repositories::album_repo::AlbumRepo;
use lightbox_db::repositories::photo_repo::PhotoRepo;
use lightbox_db::repositories::photo_server_repo::PhotoServerRepo;
use lightbox_db::repositories::user_repo::UserRepo;
use lightbox_fanout::{
    register_photo_server, FanoutReport, RegistrationError, Replicator, RetryConfig, SetCommand,
    ShardDelta, TransportError, UpdateTransport,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct OkTransport;

#[async_trait]
impl UpdateTransport for OkTransport {
    async fn send_commands(
        &self,
        _server: &PhotoServer,
        _commands: &[SetCommand],
    ) -> Result<(), TransportError> {
        Ok(())
    }
}

struct FailingTransport;

#[async_trait]
impl UpdateTransport for FailingTransport {
    async fn send_commands(
        &self,
        _server: &PhotoServer,
        _commands: &[SetCommand],
    ) -> Result<(), TransportError> {
        Err(TransportError::HttpStatus(500))
    }
}

/// Records every delivery as (update URL, commands).
#[derive(Default)]
struct RecordingTransport {
    calls: Mutex<Vec<(String, Vec<SetCommand>)>>,
}

#[async_trait]
impl UpdateTransport for RecordingTransport {
    async fn send_commands(
        &self,
        server: &PhotoServer,
        commands: &[SetCommand],
    ) -> Result<(), TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((server.photos_update_url.clone(), commands.to_vec()));
        Ok(())
    }
}

fn fast_retry() -> RetryConfig {
    RetryConfig {
        attempts: 2,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(1),
        multiplier: 1.0,
    }
}

fn registration(subdomain: &str, url: &str) -> RegisterPhotoServer {
    RegisterPhotoServer {
        subdomain: subdomain.to_string(),
        photos_update_url: url.to_string(),
        auth_key: "test-key".to_string(),
    }
}

async fn seed_album(pool: &PgPool) -> (DbId, DbId) {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            nickname: "alice".to_string(),
        },
        Utc::now(),
    )
    .await
    .unwrap();
    let mut tx = pool.begin().await.unwrap();
    let album = AlbumRepo::create(
        &mut tx,
        &CreateAlbum {
            name: "Trip".to_string(),
            creator_id: user.id,
        },
        Utc::now(),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    (album.id, user.id)
}

/// Insert a committed photo directly, bypassing the engine.
async fn seed_photo(pool: &PgPool, album_id: DbId, author_id: DbId, subdomain: &str, index: i64) -> String {
    let photo_id = ids::generate_photo_id();
    let mut tx = pool.begin().await.unwrap();
    PhotoRepo::insert(
        &mut tx,
        &CreatePhoto {
            photo_id: photo_id.clone(),
            storage_id: ids::generate_storage_id(),
            subdomain: subdomain.to_string(),
            author_id,
            album_id,
            album_index: index,
            copied_from_photo_id: None,
        },
        Utc::now(),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    photo_id
}

fn delta(subdomain: &str, commands: Vec<SetCommand>) -> ShardDelta {
    ShardDelta {
        subdomain: subdomain.to_string(),
        commands,
    }
}

// ---------------------------------------------------------------------------
// Replication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replicate_reaches_every_server_on_the_shard(pool: PgPool) {
    let recorder = Arc::new(RecordingTransport::default());
    register_photo_server(
        &pool,
        recorder.as_ref(),
        &fast_retry(),
        &registration("photos01", "https://a.example/update"),
        Utc::now(),
    )
    .await
    .unwrap();
    register_photo_server(
        &pool,
        recorder.as_ref(),
        &fast_retry(),
        &registration("photos01", "https://b.example/update"),
        Utc::now(),
    )
    .await
    .unwrap();

    let replicator = Replicator::new(pool.clone(), recorder.clone(), fast_retry());
    let commands = vec![SetCommand::set(ids::generate_photo_id(), ids::generate_storage_id())];
    let report = replicator.replicate(&[delta("photos01", commands.clone())]).await.unwrap();

    assert_eq!(report, FanoutReport { delivered: 2, tripped: 0 });
    let calls = recorder.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(_, sent)| *sent == commands));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replicate_skips_deltas_with_no_commands(pool: PgPool) {
    let recorder = Arc::new(RecordingTransport::default());
    register_photo_server(
        &pool,
        recorder.as_ref(),
        &fast_retry(),
        &registration("photos01", "https://a.example/update"),
        Utc::now(),
    )
    .await
    .unwrap();

    let replicator = Replicator::new(pool.clone(), recorder.clone(), fast_retry());
    let report = replicator.replicate(&[delta("photos01", Vec::new())]).await.unwrap();

    assert_eq!(report, FanoutReport { delivered: 0, tripped: 0 });
    assert!(recorder.calls.lock().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_breaker_trips_after_exhausted_retries(pool: PgPool) {
    register_photo_server(
        &pool,
        &OkTransport,
        &fast_retry(),
        &registration("photos01", "https://a.example/update"),
        Utc::now(),
    )
    .await
    .unwrap();

    let replicator = Replicator::new(pool.clone(), Arc::new(FailingTransport), fast_retry());
    let commands = vec![SetCommand::set(ids::generate_photo_id(), ids::generate_storage_id())];
    let report = replicator.replicate(&[delta("photos01", commands.clone())]).await.unwrap();
    assert_eq!(report, FanoutReport { delivered: 0, tripped: 1 });

    let server = PhotoServerRepo::find_by_url(&pool, "https://a.example/update")
        .await
        .unwrap()
        .unwrap();
    assert!(server.unreachable);

    // A tripped server is out of rotation until it re-registers.
    let report = replicator.replicate(&[delta("photos01", commands)]).await.unwrap();
    assert_eq!(report, FanoutReport { delivered: 0, tripped: 0 });
}

// ---------------------------------------------------------------------------
// Registration and resync
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_registration_resyncs_the_full_shard(pool: PgPool) {
    let (album_id, author_id) = seed_album(&pool).await;
    let mut shard_ids = vec![
        seed_photo(&pool, album_id, author_id, "photos01", 0).await,
        seed_photo(&pool, album_id, author_id, "photos01", 1).await,
    ];
    seed_photo(&pool, album_id, author_id, "photos02", 2).await;

    let recorder = RecordingTransport::default();
    let (server, pushed) = register_photo_server(
        &pool,
        &recorder,
        &fast_retry(),
        &registration("photos01", "https://a.example/update"),
        Utc::now(),
    )
    .await
    .unwrap();

    assert_eq!(server.subdomain, "photos01");
    assert_eq!(pushed, 2);

    let calls = recorder.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let sent: Vec<&str> = calls[0].1.iter().map(|c| c.key.as_str()).collect();
    shard_ids.sort();
    assert_eq!(sent, shard_ids.iter().map(String::as_str).collect::<Vec<_>>());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_registration_rolls_back_when_resync_fails(pool: PgPool) {
    let (album_id, author_id) = seed_album(&pool).await;
    seed_photo(&pool, album_id, author_id, "photos01", 0).await;

    let err = register_photo_server(
        &pool,
        &FailingTransport,
        &fast_retry(),
        &registration("photos01", "https://a.example/update"),
        Utc::now(),
    )
    .await
    .unwrap_err();

    assert_matches!(err, RegistrationError::Resync(TransportError::HttpStatus(500)));
    let row = PhotoServerRepo::find_by_url(&pool, "https://a.example/update").await.unwrap();
    assert!(row.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reregistration_clears_the_breaker(pool: PgPool) {
    let (server, _) = register_photo_server(
        &pool,
        &OkTransport,
        &fast_retry(),
        &registration("photos01", "https://a.example/update"),
        Utc::now(),
    )
    .await
    .unwrap();
    assert!(PhotoServerRepo::mark_unreachable(&pool, server.id).await.unwrap());
    assert!(PhotoServerRepo::list_reachable(&pool, "photos01").await.unwrap().is_empty());

    let (refreshed, _) = register_photo_server(
        &pool,
        &OkTransport,
        &fast_retry(),
        &registration("photos01", "https://a.example/update"),
        Utc::now(),
    )
    .await
    .unwrap();

    assert_eq!(refreshed.id, server.id);
    assert!(!refreshed.unreachable);
    let reachable = PhotoServerRepo::list_reachable(&pool, "photos01").await.unwrap();
    assert_eq!(reachable.len(), 1);
}
