//! Repository for the `photo_comments`, `photo_user_tags`, and
//! `photo_glances` tables.
//!
//! All writes run inside the caller's mutation transaction; the unique
//! constraints double as idempotency guards for retried client requests.

use lightbox_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::social::{
    CreatePhotoComment, CreatePhotoGlance, CreatePhotoUserTag, PhotoComment, PhotoGlance,
    PhotoUserTag,
};

/// Column list for `photo_comments` queries.
const COMMENT_COLUMNS: &str = "id, photo_id, author_id, date_created, client_msg_id, comment_text";

/// Column list for `photo_user_tags` queries.
const TAG_COLUMNS: &str =
    "id, photo_id, author_id, tagged_user_id, date_created, tag_coord_x, tag_coord_y";

/// Column list for `photo_glances` queries.
const GLANCE_COLUMNS: &str = "id, photo_id, author_id, emoticon_name, date_created";

/// Provides per-photo interactions.
pub struct SocialRepo;

impl SocialRepo {
    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Insert a comment unless the same (photo, author, client_msg_id)
    /// triple already exists. Returns `None` for the duplicate.
    pub async fn insert_comment_if_new(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        create: &CreatePhotoComment,
        now: Timestamp,
    ) -> Result<Option<PhotoComment>, sqlx::Error> {
        let query = format!(
            "INSERT INTO photo_comments \
             (photo_id, author_id, date_created, client_msg_id, comment_text) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (photo_id, author_id, client_msg_id) DO NOTHING \
             RETURNING {COMMENT_COLUMNS}"
        );
        sqlx::query_as::<_, PhotoComment>(&query)
            .bind(&create.photo_id)
            .bind(create.author_id)
            .bind(now)
            .bind(create.client_msg_id)
            .bind(&create.comment_text)
            .fetch_optional(&mut **tx)
            .await
    }

    /// List a photo's comments oldest first.
    pub async fn list_comments(
        pool: &PgPool,
        photo_id: &str,
    ) -> Result<Vec<PhotoComment>, sqlx::Error> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM photo_comments \
             WHERE photo_id = $1 ORDER BY date_created, id"
        );
        sqlx::query_as::<_, PhotoComment>(&query)
            .bind(photo_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a comment, restricted to photos of the given album so a
    /// mutation scope can never touch another album's content.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete_comment_in_album(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        comment_id: DbId,
        album_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM photo_comments AS c USING photos AS p \
             WHERE c.id = $1 AND p.photo_id = c.photo_id AND p.album_id = $2",
        )
        .bind(comment_id)
        .bind(album_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // User tags
    // -----------------------------------------------------------------------

    /// Tag a user on a photo unless they are already tagged there.
    pub async fn insert_tag_if_new(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        create: &CreatePhotoUserTag,
        now: Timestamp,
    ) -> Result<Option<PhotoUserTag>, sqlx::Error> {
        let query = format!(
            "INSERT INTO photo_user_tags \
             (photo_id, author_id, tagged_user_id, date_created, tag_coord_x, tag_coord_y) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (photo_id, tagged_user_id) DO NOTHING \
             RETURNING {TAG_COLUMNS}"
        );
        sqlx::query_as::<_, PhotoUserTag>(&query)
            .bind(&create.photo_id)
            .bind(create.author_id)
            .bind(create.tagged_user_id)
            .bind(now)
            .bind(create.tag_coord_x)
            .bind(create.tag_coord_y)
            .fetch_optional(&mut **tx)
            .await
    }

    /// List a photo's user tags.
    pub async fn list_tags(
        pool: &PgPool,
        photo_id: &str,
    ) -> Result<Vec<PhotoUserTag>, sqlx::Error> {
        let query = format!(
            "SELECT {TAG_COLUMNS} FROM photo_user_tags WHERE photo_id = $1 ORDER BY date_created, id"
        );
        sqlx::query_as::<_, PhotoUserTag>(&query)
            .bind(photo_id)
            .fetch_all(pool)
            .await
    }

    /// Remove a tag, restricted to photos of the given album.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete_tag_in_album(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tag_id: DbId,
        album_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM photo_user_tags AS t USING photos AS p \
             WHERE t.id = $1 AND p.photo_id = t.photo_id AND p.album_id = $2",
        )
        .bind(tag_id)
        .bind(album_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Glances
    // -----------------------------------------------------------------------

    /// Record a glance, replacing the author's previous emoticon on the
    /// photo if one exists.
    pub async fn upsert_glance(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        create: &CreatePhotoGlance,
        now: Timestamp,
    ) -> Result<PhotoGlance, sqlx::Error> {
        let query = format!(
            "INSERT INTO photo_glances (photo_id, author_id, emoticon_name, date_created) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (photo_id, author_id) DO UPDATE SET \
                 emoticon_name = EXCLUDED.emoticon_name, \
                 date_created = EXCLUDED.date_created \
             RETURNING {GLANCE_COLUMNS}"
        );
        sqlx::query_as::<_, PhotoGlance>(&query)
            .bind(&create.photo_id)
            .bind(create.author_id)
            .bind(&create.emoticon_name)
            .bind(now)
            .fetch_one(&mut **tx)
            .await
    }

    /// List a photo's glances.
    pub async fn list_glances(
        pool: &PgPool,
        photo_id: &str,
    ) -> Result<Vec<PhotoGlance>, sqlx::Error> {
        let query = format!(
            "SELECT {GLANCE_COLUMNS} FROM photo_glances WHERE photo_id = $1 ORDER BY date_created, id"
        );
        sqlx::query_as::<_, PhotoGlance>(&query)
            .bind(photo_id)
            .fetch_all(pool)
            .await
    }
}
