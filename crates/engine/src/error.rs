//! Engine error types.

use lightbox_core::types::DbId;

/// Errors from the pending upload registry.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// No pending upload exists for the photo id.
    #[error("no pending upload for photo id {0}")]
    UnknownPhoto(String),

    /// Processing-done was reported before the upload itself finished.
    #[error("photo {0} was marked processed before its upload finished")]
    NotUploaded(String),

    /// The database failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Why a batch photo commit (or copy) was refused.
///
/// The whole batch is validated before anything is written, so any of these
/// means no photo from the batch was committed.
#[derive(Debug, thiserror::Error)]
pub enum AddPhotoError {
    /// The id names neither a pending upload nor a committed photo, or is
    /// not a well-formed photo id at all.
    #[error("photo id {0} is not a known pending or committed photo")]
    InvalidPhotoId(String),

    /// The pending upload exists but its bytes never arrived.
    #[error("photo {0} has not finished uploading")]
    PhotoNotUploaded(String),

    /// Remote processing did not finish within the configured wait cap.
    /// Fatal: callers must surface it, never silently drop photos.
    #[error("timed out waiting for photo {0} to finish processing")]
    ProcessingTimeout(String),

    /// The database failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors from an [`AlbumMutation`](crate::album::AlbumMutation) scope.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// The album does not exist.
    #[error("album {0} not found")]
    AlbumNotFound(DbId),

    /// The referenced photo is not part of the album under mutation.
    #[error("photo {photo_id} is not in album {album_id}")]
    PhotoNotInAlbum { photo_id: String, album_id: DbId },

    /// The database failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
