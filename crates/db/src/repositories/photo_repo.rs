//! Repository for the `photos` table.

use lightbox_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::photo::{CreatePhoto, Photo, PhotoRef};

/// Column list for `photos` queries.
const COLUMNS: &str = "photo_id, storage_id, subdomain, date_created, author_id, \
    album_id, album_index, copied_from_photo_id";

/// Constraint violated when two transactions race for the same album slot.
pub const ALBUM_INDEX_CONSTRAINT: &str = "uq_photos_album_index";

/// Constraint violated when the same photo ID is committed twice.
pub const PHOTO_ID_CONSTRAINT: &str = "photos_pkey";

/// Provides committed photo rows.
pub struct PhotoRepo;

impl PhotoRepo {
    /// Whether a committed photo exists for the ID.
    pub async fn exists(pool: &PgPool, photo_id: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM photos WHERE photo_id = $1)")
            .bind(photo_id)
            .fetch_one(pool)
            .await
    }

    /// Find a photo by ID.
    pub async fn find_by_id(pool: &PgPool, photo_id: &str) -> Result<Option<Photo>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM photos WHERE photo_id = $1");
        sqlx::query_as::<_, Photo>(&query)
            .bind(photo_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a photo by ID within an existing transaction.
    pub async fn find_by_id_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        photo_id: &str,
    ) -> Result<Option<Photo>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM photos WHERE photo_id = $1");
        sqlx::query_as::<_, Photo>(&query)
            .bind(photo_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Highest `album_index` currently committed for the album, if any.
    ///
    /// Read inside the committing transaction so the next slot is `max + 1`;
    /// the unique constraint catches the case where a concurrent commit
    /// claimed the slot first.
    pub async fn max_album_index(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        album_id: DbId,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(album_index) FROM photos WHERE album_id = $1",
        )
        .bind(album_id)
        .fetch_one(&mut **tx)
        .await
    }

    /// Insert a committed photo.
    ///
    /// Unique violations (`photos_pkey`, `uq_photos_album_index`) are left
    /// to the caller, which classifies and retries them.
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        create: &CreatePhoto,
        now: Timestamp,
    ) -> Result<Photo, sqlx::Error> {
        let query = format!(
            "INSERT INTO photos \
             (photo_id, storage_id, subdomain, date_created, author_id, album_id, \
              album_index, copied_from_photo_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Photo>(&query)
            .bind(&create.photo_id)
            .bind(&create.storage_id)
            .bind(&create.subdomain)
            .bind(now)
            .bind(create.author_id)
            .bind(create.album_id)
            .bind(create.album_index)
            .bind(create.copied_from_photo_id.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    /// List an album's photos in index order.
    pub async fn list_by_album(pool: &PgPool, album_id: DbId) -> Result<Vec<Photo>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM photos WHERE album_id = $1 ORDER BY album_index");
        sqlx::query_as::<_, Photo>(&query)
            .bind(album_id)
            .fetch_all(pool)
            .await
    }

    /// Whether the album already holds a photo by this author backed by the
    /// storage ID.
    ///
    /// Used as the copy dedup guard: an author copying the same source into
    /// an album twice must not produce a second row. Scoped to the author so
    /// two different users can each copy the same photo into a shared album.
    pub async fn copy_exists(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        album_id: DbId,
        author_id: DbId,
        storage_id: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM photos \
             WHERE album_id = $1 AND author_id = $2 AND storage_id = $3)",
        )
        .bind(album_id)
        .bind(author_id)
        .bind(storage_id)
        .fetch_one(&mut **tx)
        .await
    }

    /// Snapshot of every (photo_id, storage_id) pair served by a shard.
    ///
    /// Taken under `lock_share` during photo-server registration so the
    /// resync payload is consistent with concurrent commits.
    pub async fn shard_refs(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        subdomain: &str,
    ) -> Result<Vec<PhotoRef>, sqlx::Error> {
        sqlx::query_as::<_, PhotoRef>(
            "SELECT photo_id, storage_id FROM photos WHERE subdomain = $1 ORDER BY photo_id",
        )
        .bind(subdomain)
        .fetch_all(&mut **tx)
        .await
    }

    /// Take a SHARE lock on `photos`, blocking writers for the rest of the
    /// transaction while readers proceed.
    pub async fn lock_share(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("LOCK TABLE photos IN SHARE MODE")
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
