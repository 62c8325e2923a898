//! Pending upload model and DTOs.

use lightbox_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `pending_photos` table.
///
/// Lives from upload-slot creation until the photo is committed into an
/// album, at which point the row is deleted in the committing transaction.
/// The two nullable timestamps record upload and processing completion.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PendingPhoto {
    pub photo_id: String,
    pub storage_id: String,
    pub author_id: DbId,
    pub bucket: String,
    pub start_time: Timestamp,
    pub file_uploaded_time: Option<Timestamp>,
    pub processing_done_time: Option<Timestamp>,
}

impl PendingPhoto {
    /// A pending photo is committable once its upload (and, when remote
    /// processing is enabled, its processing) has finished.
    pub fn is_uploaded(&self) -> bool {
        self.file_uploaded_time.is_some()
    }

    pub fn is_processed(&self) -> bool {
        self.processing_done_time.is_some()
    }
}

/// DTO for registering a new pending upload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePendingPhoto {
    pub photo_id: String,
    pub storage_id: String,
    pub author_id: DbId,
    pub bucket: String,
}
