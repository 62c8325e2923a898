//! Album membership model and DTOs.

use lightbox_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `album_members` table.
///
/// One row per (album, user). `album_name` is the member's private
/// display-name override; `last_access` drives the new-photo count and is
/// updated outside the revision machinery.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlbumMember {
    pub id: DbId,
    pub album_id: DbId,
    pub user_id: DbId,
    pub added_by_user_id: DbId,
    pub date_added: Timestamp,
    pub album_name: Option<String>,
    pub last_access: Option<Timestamp>,
}

/// DTO for adding a member to an album.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAlbumMember {
    pub album_id: DbId,
    pub user_id: DbId,
    pub added_by_user_id: DbId,
}
