//! Album entity model and DTOs.

use lightbox_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `albums` table.
///
/// `revision_number` is the cache-validation token handed to clients: it
/// strictly increases across committed mutations and never moves backwards.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Album {
    pub id: DbId,
    pub name: String,
    pub creator_id: DbId,
    pub date_created: Timestamp,
    pub last_updated: Timestamp,
    pub revision_number: i64,
}

/// DTO for creating a new album.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAlbum {
    pub name: String,
    pub creator_id: DbId,
}
