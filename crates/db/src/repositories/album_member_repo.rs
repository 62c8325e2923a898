//! Repository for the `album_members` table.

use lightbox_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::album_member::{AlbumMember, CreateAlbumMember};

/// Column list for `album_members` queries.
const COLUMNS: &str = "id, album_id, user_id, added_by_user_id, date_added, album_name, last_access";

/// Provides membership rows linking users to albums.
pub struct AlbumMemberRepo;

impl AlbumMemberRepo {
    /// Insert a membership row unless one already exists for (album, user).
    ///
    /// Returns the new row, or `None` when the user was already a member.
    /// The `ON CONFLICT DO NOTHING` makes concurrent double-adds converge on
    /// a single row without surfacing an error.
    pub async fn insert_if_absent(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        create: &CreateAlbumMember,
        now: Timestamp,
    ) -> Result<Option<AlbumMember>, sqlx::Error> {
        let query = format!(
            "INSERT INTO album_members (album_id, user_id, added_by_user_id, date_added) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (album_id, user_id) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlbumMember>(&query)
            .bind(create.album_id)
            .bind(create.user_id)
            .bind(create.added_by_user_id)
            .bind(now)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Find the membership row for (album, user).
    pub async fn find(
        pool: &PgPool,
        album_id: DbId,
        user_id: DbId,
    ) -> Result<Option<AlbumMember>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM album_members WHERE album_id = $1 AND user_id = $2");
        sqlx::query_as::<_, AlbumMember>(&query)
            .bind(album_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Whether the user is currently a member of the album.
    pub async fn is_member(
        pool: &PgPool,
        album_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM album_members WHERE album_id = $1 AND user_id = $2)",
        )
        .bind(album_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// List the members of an album in join order.
    pub async fn list_by_album(
        pool: &PgPool,
        album_id: DbId,
    ) -> Result<Vec<AlbumMember>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM album_members WHERE album_id = $1 ORDER BY date_added, id"
        );
        sqlx::query_as::<_, AlbumMember>(&query)
            .bind(album_id)
            .fetch_all(pool)
            .await
    }

    /// Delete the membership row for (album, user).
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        album_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM album_members WHERE album_id = $1 AND user_id = $2")
            .bind(album_id)
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Advance `last_access`, never moving it backwards.
    ///
    /// Returns `true` if the timestamp advanced. Runs outside the revision
    /// machinery: viewing an album must not invalidate other members'
    /// caches.
    pub async fn update_last_access(
        pool: &PgPool,
        album_id: DbId,
        user_id: DbId,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE album_members SET last_access = $3 \
             WHERE album_id = $1 AND user_id = $2 \
               AND (last_access IS NULL OR last_access < $3)",
        )
        .bind(album_id)
        .bind(user_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set or clear the member's private name override for the album.
    pub async fn set_album_name(
        pool: &PgPool,
        album_id: DbId,
        user_id: DbId,
        album_name: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE album_members SET album_name = $3 WHERE album_id = $1 AND user_id = $2",
        )
        .bind(album_id)
        .bind(user_id)
        .bind(album_name)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count photos added by other members since the user's last access.
    ///
    /// A member who has never opened the album counts every photo authored
    /// by someone else. Non-members get 0.
    pub async fn new_photo_count(
        pool: &PgPool,
        album_id: DbId,
        user_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM photos p \
             JOIN album_members m ON m.album_id = p.album_id AND m.user_id = $2 \
             WHERE p.album_id = $1 AND p.author_id <> $2 \
               AND (m.last_access IS NULL OR p.date_created > m.last_access)",
        )
        .bind(album_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
