//! Repository for the `albums` table.

use lightbox_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::album::{Album, CreateAlbum};

/// Column list for `albums` queries.
const COLUMNS: &str = "id, name, creator_id, date_created, last_updated, revision_number";

/// Provides album rows and the revision counter.
pub struct AlbumRepo;

impl AlbumRepo {
    /// Insert a new album at revision 0.
    pub async fn create(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        create: &CreateAlbum,
        now: Timestamp,
    ) -> Result<Album, sqlx::Error> {
        let query = format!(
            "INSERT INTO albums (name, creator_id, date_created, last_updated, revision_number) \
             VALUES ($1, $2, $3, $3, 0) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Album>(&query)
            .bind(&create.name)
            .bind(create.creator_id)
            .bind(now)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find an album by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Album>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM albums WHERE id = $1");
        sqlx::query_as::<_, Album>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an album by its ID within an existing transaction.
    pub async fn find_by_id_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<Option<Album>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM albums WHERE id = $1");
        sqlx::query_as::<_, Album>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Current revision number, or `None` if the album does not exist.
    pub async fn get_revision(pool: &PgPool, id: DbId) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT revision_number FROM albums WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Increment the revision counter and touch `last_updated`.
    ///
    /// The increment happens in SQL so concurrent transactions serialize on
    /// the row instead of overwriting each other's bump. Returns the new
    /// revision number.
    pub async fn bump_revision(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        album_id: DbId,
        now: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE albums \
             SET revision_number = revision_number + 1, last_updated = $2 \
             WHERE id = $1 \
             RETURNING revision_number",
        )
        .bind(album_id)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
    }

    /// List the albums a user belongs to, most recently updated first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Album>, sqlx::Error> {
        sqlx::query_as::<_, Album>(
            "SELECT a.id, a.name, a.creator_id, a.date_created, a.last_updated, \
                    a.revision_number \
             FROM albums a \
             JOIN album_members m ON m.album_id = a.id \
             WHERE m.user_id = $1 \
             ORDER BY a.last_updated DESC, a.id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
