//! Pending upload registry.
//!
//! A client asks for an upload slot, receives a freshly minted photo id and
//! storage id, uploads the bytes, and (when remote processing is enabled)
//! waits for the processor to report completion. Only then may the photo be
//! committed into an album by [`crate::photos::commit_pending_photos`].

use lightbox_core::config::{EngineConfig, ProcessingMode};
use lightbox_core::ids;
use lightbox_core::types::{DbId, Timestamp};
use lightbox_db::models::pending_photo::{CreatePendingPhoto, PendingPhoto};
use lightbox_db::repositories::pending_photo_repo::PendingPhotoRepo;
use lightbox_db::repositories::photo_repo::PhotoRepo;
use lightbox_db::unique_violation;
use sqlx::PgPool;

use crate::error::UploadError;

/// Mint a new upload slot for `author_id`.
///
/// The photo id and storage id are drawn independently at random; the
/// bucket is a uniform pick from the configured upload locations. A minted
/// id that collides with any existing pending or committed row — including
/// one raced in by a concurrent minter — is discarded and re-minted.
pub async fn create_upload_slot(
    pool: &PgPool,
    config: &EngineConfig,
    author_id: DbId,
    now: Timestamp,
) -> Result<PendingPhoto, UploadError> {
    loop {
        let photo_id = ids::generate_photo_id();
        if PhotoRepo::exists(pool, &photo_id).await?
            || PendingPhotoRepo::exists(pool, &photo_id).await?
        {
            tracing::debug!("Minted photo id collides with an existing row, re-minting");
            continue;
        }

        let create = CreatePendingPhoto {
            photo_id,
            storage_id: ids::generate_storage_id(),
            author_id,
            bucket: config.random_upload_bucket().canonical(),
        };
        match PendingPhotoRepo::insert(pool, &create, now).await {
            Ok(pending) => {
                tracing::debug!(
                    photo_id = %pending.photo_id,
                    author_id,
                    bucket = %pending.bucket,
                    "Created upload slot"
                );
                return Ok(pending);
            }
            Err(e) if unique_violation(&e).is_some() => {
                tracing::debug!("Upload slot lost a mint race, re-minting");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Record that the client finished uploading the photo bytes.
///
/// Idempotent: repeating the call keeps the first recorded time.
pub async fn mark_file_uploaded(
    pool: &PgPool,
    photo_id: &str,
    at: Timestamp,
) -> Result<PendingPhoto, UploadError> {
    match PendingPhotoRepo::mark_file_uploaded(pool, photo_id, at).await? {
        Some(pending) => {
            tracing::debug!(photo_id, "Recorded file upload");
            Ok(pending)
        }
        None => Err(UploadError::UnknownPhoto(photo_id.to_string())),
    }
}

/// Record that server-side processing finished.
///
/// Idempotent once valid; reporting processing-done for an upload whose
/// bytes never arrived is an ordering bug and is rejected.
pub async fn mark_processing_done(
    pool: &PgPool,
    photo_id: &str,
    at: Timestamp,
) -> Result<PendingPhoto, UploadError> {
    if let Some(pending) = PendingPhotoRepo::mark_processing_done(pool, photo_id, at).await? {
        tracing::debug!(photo_id, "Recorded processing completion");
        return Ok(pending);
    }
    // The update matched nothing: either no such pending upload, or its
    // bytes have not arrived yet.
    match PendingPhotoRepo::find_by_id(pool, photo_id).await? {
        Some(_) => Err(UploadError::NotUploaded(photo_id.to_string())),
        None => Err(UploadError::UnknownPhoto(photo_id.to_string())),
    }
}

/// Whether a pending photo may be committed into an album under the given
/// processing mode.
pub fn is_committable(pending: &PendingPhoto, mode: ProcessingMode) -> bool {
    match mode {
        ProcessingMode::Local => pending.is_uploaded(),
        ProcessingMode::Remote => pending.is_uploaded() && pending.is_processed(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn pending(uploaded: bool, processed: bool) -> PendingPhoto {
        let now = Utc::now();
        PendingPhoto {
            photo_id: "ab".repeat(32),
            storage_id: "cd".repeat(32),
            author_id: 1,
            bucket: "local:photo-uploads".to_string(),
            start_time: now,
            file_uploaded_time: uploaded.then_some(now),
            processing_done_time: processed.then_some(now),
        }
    }

    #[test]
    fn local_mode_needs_only_the_upload() {
        assert!(!is_committable(&pending(false, false), ProcessingMode::Local));
        assert!(is_committable(&pending(true, false), ProcessingMode::Local));
    }

    #[test]
    fn remote_mode_also_needs_processing() {
        assert!(!is_committable(&pending(true, false), ProcessingMode::Remote));
        assert!(is_committable(&pending(true, true), ProcessingMode::Remote));
    }

    #[test]
    fn unprocessed_unuploaded_never_committable() {
        assert!(!is_committable(&pending(false, false), ProcessingMode::Remote));
    }
}
