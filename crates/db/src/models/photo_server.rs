//! Photo server registry model and DTOs.

use lightbox_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `photo_servers` table.
///
/// `unreachable` is the fan-out circuit breaker: set once a delivery
/// exhausts its retries, cleared when the server re-registers.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhotoServer {
    pub id: DbId,
    pub subdomain: String,
    pub photos_update_url: String,
    pub auth_key: String,
    pub date_registered: Timestamp,
    pub unreachable: bool,
}

/// DTO for registering (or re-registering) a photo server.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPhotoServer {
    pub subdomain: String,
    pub photos_update_url: String,
    pub auth_key: String,
}
