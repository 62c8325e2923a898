//! Integration tests for per-photo interactions:
//! - Comment idempotency keyed by (photo, author, client_msg_id)
//! - Tag idempotency keyed by (photo, tagged user)
//! - Glance replacement
//! - Album-scoped deletes

use chrono::Utc;
use lightbox_core::ids;
use lightbox_core::types::DbId;
use lightbox_db::models::album::CreateAlbum;
use lightbox_db::models::photo::{CreatePhoto, Photo};
use lightbox_db::models::social::{CreatePhotoComment, CreatePhotoGlance, CreatePhotoUserTag};
use lightbox_db::models::user::{CreateUser, User};
use lightbox_db::repositories::album_repo::AlbumRepo;
use lightbox_db::repositories::photo_repo::PhotoRepo;
use lightbox_db::repositories::social_repo::SocialRepo;
use lightbox_db::repositories::user_repo::UserRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, nickname: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            nickname: nickname.to_string(),
        },
        Utc::now(),
    )
    .await
    .unwrap()
}

async fn seed_album_with_photo(pool: &PgPool, author_id: DbId) -> (DbId, Photo) {
    let mut tx = pool.begin().await.unwrap();
    let album = AlbumRepo::create(
        &mut tx,
        &CreateAlbum {
            name: "Test".to_string(),
            creator_id: author_id,
        },
        Utc::now(),
    )
    .await
    .unwrap();
    let photo = PhotoRepo::insert(
        &mut tx,
        &CreatePhoto {
            photo_id: ids::generate_photo_id(),
            storage_id: ids::generate_storage_id(),
            subdomain: "photos01".to_string(),
            author_id,
            album_id: album.id,
            album_index: 0,
            copied_from_photo_id: None,
        },
        Utc::now(),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    (album.id, photo)
}

fn comment(photo_id: &str, author_id: DbId, client_msg_id: i64, text: &str) -> CreatePhotoComment {
    CreatePhotoComment {
        photo_id: photo_id.to_string(),
        author_id,
        client_msg_id,
        comment_text: text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Test: comments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_comment_retries_land_on_one_row(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let (_, photo) = seed_album_with_photo(&pool, user.id).await;

    let mut tx = pool.begin().await.unwrap();
    let first = SocialRepo::insert_comment_if_new(
        &mut tx,
        &comment(&photo.photo_id, user.id, 7, "nice"),
        Utc::now(),
    )
    .await
    .unwrap();
    let retry = SocialRepo::insert_comment_if_new(
        &mut tx,
        &comment(&photo.photo_id, user.id, 7, "nice"),
        Utc::now(),
    )
    .await
    .unwrap();
    let next = SocialRepo::insert_comment_if_new(
        &mut tx,
        &comment(&photo.photo_id, user.id, 8, "another"),
        Utc::now(),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert!(first.is_some());
    assert!(retry.is_none());
    assert!(next.is_some());
    let comments = SocialRepo::list_comments(&pool, &photo.photo_id).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].comment_text, "nice");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_comment_delete_is_album_scoped(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let (album_id, photo) = seed_album_with_photo(&pool, user.id).await;
    let (other_album, _) = seed_album_with_photo(&pool, user.id).await;

    let mut tx = pool.begin().await.unwrap();
    let row = SocialRepo::insert_comment_if_new(
        &mut tx,
        &comment(&photo.photo_id, user.id, 1, "hello"),
        Utc::now(),
    )
    .await
    .unwrap()
    .unwrap();

    // Wrong album: the row survives.
    assert!(!SocialRepo::delete_comment_in_album(&mut tx, row.id, other_album).await.unwrap());
    assert!(SocialRepo::delete_comment_in_album(&mut tx, row.id, album_id).await.unwrap());
    tx.commit().await.unwrap();

    assert!(SocialRepo::list_comments(&pool, &photo.photo_id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: user tags
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tagging_a_user_twice_is_one_row(pool: PgPool) {
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;
    let (album_id, photo) = seed_album_with_photo(&pool, alice.id).await;

    let create = CreatePhotoUserTag {
        photo_id: photo.photo_id.clone(),
        author_id: alice.id,
        tagged_user_id: bob.id,
        tag_coord_x: 0.25,
        tag_coord_y: 0.75,
    };

    let mut tx = pool.begin().await.unwrap();
    let first = SocialRepo::insert_tag_if_new(&mut tx, &create, Utc::now()).await.unwrap();
    // Even a different author cannot tag the same user again.
    let mut again = create.clone();
    again.author_id = bob.id;
    let second = SocialRepo::insert_tag_if_new(&mut tx, &again, Utc::now()).await.unwrap();
    tx.commit().await.unwrap();

    assert!(first.is_some());
    assert!(second.is_none());

    let tags = SocialRepo::list_tags(&pool, &photo.photo_id).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].tagged_user_id, bob.id);
    assert!((tags[0].tag_coord_x - 0.25).abs() < f32::EPSILON);

    let mut tx = pool.begin().await.unwrap();
    assert!(SocialRepo::delete_tag_in_album(&mut tx, tags[0].id, album_id).await.unwrap());
    tx.commit().await.unwrap();
}

// ---------------------------------------------------------------------------
// Test: glances
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_glance_replaces_previous_emoticon(pool: PgPool) {
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;
    let (_, photo) = seed_album_with_photo(&pool, alice.id).await;

    let mut tx = pool.begin().await.unwrap();
    let smile = SocialRepo::upsert_glance(
        &mut tx,
        &CreatePhotoGlance {
            photo_id: photo.photo_id.clone(),
            author_id: alice.id,
            emoticon_name: "smile".to_string(),
        },
        Utc::now(),
    )
    .await
    .unwrap();
    let wow = SocialRepo::upsert_glance(
        &mut tx,
        &CreatePhotoGlance {
            photo_id: photo.photo_id.clone(),
            author_id: alice.id,
            emoticon_name: "wow".to_string(),
        },
        Utc::now(),
    )
    .await
    .unwrap();
    SocialRepo::upsert_glance(
        &mut tx,
        &CreatePhotoGlance {
            photo_id: photo.photo_id.clone(),
            author_id: bob.id,
            emoticon_name: "heart".to_string(),
        },
        Utc::now(),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    // The same author's repeat glance replaced the row in place.
    assert_eq!(wow.id, smile.id);
    assert_eq!(wow.emoticon_name, "wow");

    let glances = SocialRepo::list_glances(&pool, &photo.photo_id).await.unwrap();
    assert_eq!(glances.len(), 2);
}
