//! Per-photo interaction models and DTOs.
//!
//! Covers three related tables:
//! - `photo_comments` -- threaded text comments, deduplicated per client
//! - `photo_user_tags` -- users tagged at a coordinate on a photo
//! - `photo_glances` -- one emoticon reaction per (photo, author)

use lightbox_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// PhotoComment
// ---------------------------------------------------------------------------

/// A row from the `photo_comments` table.
///
/// `client_msg_id` is a client-chosen token; the unique constraint over
/// (photo, author, client_msg_id) makes retried submissions idempotent.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhotoComment {
    pub id: DbId,
    pub photo_id: String,
    pub author_id: DbId,
    pub date_created: Timestamp,
    pub client_msg_id: i64,
    pub comment_text: String,
}

/// DTO for posting a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePhotoComment {
    pub photo_id: String,
    pub author_id: DbId,
    pub client_msg_id: i64,
    pub comment_text: String,
}

// ---------------------------------------------------------------------------
// PhotoUserTag
// ---------------------------------------------------------------------------

/// A row from the `photo_user_tags` table.
///
/// Coordinates are normalized to [0, 1] relative to the photo extents.
/// A user can be tagged at most once per photo.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhotoUserTag {
    pub id: DbId,
    pub photo_id: String,
    pub author_id: DbId,
    pub tagged_user_id: DbId,
    pub date_created: Timestamp,
    pub tag_coord_x: f32,
    pub tag_coord_y: f32,
}

/// DTO for tagging a user on a photo.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePhotoUserTag {
    pub photo_id: String,
    pub author_id: DbId,
    pub tagged_user_id: DbId,
    pub tag_coord_x: f32,
    pub tag_coord_y: f32,
}

// ---------------------------------------------------------------------------
// PhotoGlance
// ---------------------------------------------------------------------------

/// A row from the `photo_glances` table.
///
/// At most one glance per (photo, author); re-glancing replaces the
/// emoticon in place.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhotoGlance {
    pub id: DbId,
    pub photo_id: String,
    pub author_id: DbId,
    pub emoticon_name: String,
    pub date_created: Timestamp,
}

/// DTO for recording a glance.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePhotoGlance {
    pub photo_id: String,
    pub author_id: DbId,
    pub emoticon_name: String,
}
