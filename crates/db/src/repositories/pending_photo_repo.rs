//! Repository for the `pending_photos` table.

use lightbox_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::pending_photo::{CreatePendingPhoto, PendingPhoto};

/// Column list for `pending_photos` queries.
const COLUMNS: &str = "photo_id, storage_id, author_id, bucket, start_time, \
    file_uploaded_time, processing_done_time";

/// Provides the pending upload registry.
pub struct PendingPhotoRepo;

impl PendingPhotoRepo {
    /// Register a freshly minted upload slot.
    ///
    /// A primary-key or storage-id collision surfaces as a unique violation;
    /// the caller mints a new ID and retries.
    pub async fn insert(
        pool: &PgPool,
        create: &CreatePendingPhoto,
        now: Timestamp,
    ) -> Result<PendingPhoto, sqlx::Error> {
        let query = format!(
            "INSERT INTO pending_photos (photo_id, storage_id, author_id, bucket, start_time) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PendingPhoto>(&query)
            .bind(&create.photo_id)
            .bind(&create.storage_id)
            .bind(create.author_id)
            .bind(&create.bucket)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a pending upload by photo ID.
    pub async fn find_by_id(
        pool: &PgPool,
        photo_id: &str,
    ) -> Result<Option<PendingPhoto>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pending_photos WHERE photo_id = $1");
        sqlx::query_as::<_, PendingPhoto>(&query)
            .bind(photo_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a pending upload by photo ID within an existing transaction.
    pub async fn find_by_id_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        photo_id: &str,
    ) -> Result<Option<PendingPhoto>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pending_photos WHERE photo_id = $1");
        sqlx::query_as::<_, PendingPhoto>(&query)
            .bind(photo_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Whether a pending upload exists for the photo ID.
    pub async fn exists(pool: &PgPool, photo_id: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM pending_photos WHERE photo_id = $1)",
        )
        .bind(photo_id)
        .fetch_one(pool)
        .await
    }

    /// Record that the client finished uploading the bytes.
    ///
    /// Idempotent: the first recorded time wins. Returns the updated row, or
    /// `None` when no pending upload exists for the ID.
    pub async fn mark_file_uploaded(
        pool: &PgPool,
        photo_id: &str,
        at: Timestamp,
    ) -> Result<Option<PendingPhoto>, sqlx::Error> {
        let query = format!(
            "UPDATE pending_photos \
             SET file_uploaded_time = COALESCE(file_uploaded_time, $2) \
             WHERE photo_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PendingPhoto>(&query)
            .bind(photo_id)
            .bind(at)
            .fetch_optional(pool)
            .await
    }

    /// Record that server-side processing finished.
    ///
    /// Only applies to uploads whose bytes have already arrived; returns
    /// `None` otherwise, leaving the caller to distinguish a missing row
    /// from an out-of-order call.
    pub async fn mark_processing_done(
        pool: &PgPool,
        photo_id: &str,
        at: Timestamp,
    ) -> Result<Option<PendingPhoto>, sqlx::Error> {
        let query = format!(
            "UPDATE pending_photos \
             SET processing_done_time = COALESCE(processing_done_time, $2) \
             WHERE photo_id = $1 AND file_uploaded_time IS NOT NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PendingPhoto>(&query)
            .bind(photo_id)
            .bind(at)
            .fetch_optional(pool)
            .await
    }

    /// Remove a pending upload, normally as part of the committing
    /// transaction that moves it into `photos`.
    pub async fn delete(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        photo_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pending_photos WHERE photo_id = $1")
            .bind(photo_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
