//! Committed photo model and DTOs.

use lightbox_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `photos` table.
///
/// `album_index` is the photo's position within its album, dense from 0.
/// `subdomain` names the serving shard the photo was assigned at commit
/// time. `copied_from_photo_id` records copy lineage across albums.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Photo {
    pub photo_id: String,
    pub storage_id: String,
    pub subdomain: String,
    pub date_created: Timestamp,
    pub author_id: DbId,
    pub album_id: DbId,
    pub album_index: i64,
    pub copied_from_photo_id: Option<String>,
}

/// DTO for inserting a committed photo.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePhoto {
    pub photo_id: String,
    pub storage_id: String,
    pub subdomain: String,
    pub author_id: DbId,
    pub album_id: DbId,
    pub album_index: i64,
    pub copied_from_photo_id: Option<String>,
}

/// Minimal (photo_id, storage_id) projection pushed to photo servers.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhotoRef {
    pub photo_id: String,
    pub storage_id: String,
}
