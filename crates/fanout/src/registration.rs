//! Photo-server registration and full resync.
//!
//! Registration is the administrative recovery path for a tripped breaker:
//! it refreshes (or creates) the server row, clears `unreachable`, and
//! pushes the shard's complete photo list so the server catches up on
//! everything it missed while out of rotation.

use chrono::{DateTime, Utc};
use lightbox_db::models::photo_server::{PhotoServer, RegisterPhotoServer};
use lightbox_db::repositories::photo_repo::PhotoRepo;
use lightbox_db::repositories::photo_server_repo::PhotoServerRepo;
use sqlx::PgPool;

use crate::commands::SetCommand;
use crate::retry::{deliver_with_retry, RetryConfig};
use crate::transport::{TransportError, UpdateTransport};

/// Error type for a failed registration.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The full-resync push failed; the registration was rolled back.
    #[error("resync delivery failed: {0}")]
    Resync(#[from] TransportError),
}

/// Register a photo server and resync its shard.
///
/// Runs in one transaction holding a SHARE lock on `photos`, so no commit
/// can slip between the snapshot and the moment the refreshed registration
/// becomes visible to fan-out. The push itself happens under the lock; if
/// it fails the whole registration rolls back and the breaker stays
/// tripped. Returns the registration row and the number of photos pushed.
pub async fn register_photo_server(
    pool: &PgPool,
    transport: &dyn UpdateTransport,
    retry: &RetryConfig,
    register: &RegisterPhotoServer,
    now: DateTime<Utc>,
) -> Result<(PhotoServer, usize), RegistrationError> {
    let mut tx = pool.begin().await?;

    let server = PhotoServerRepo::upsert(&mut tx, register, now).await?;
    PhotoRepo::lock_share(&mut tx).await?;
    let refs = PhotoRepo::shard_refs(&mut tx, &register.subdomain).await?;

    let commands: Vec<SetCommand> = refs
        .into_iter()
        .map(|r| SetCommand::set(r.photo_id, r.storage_id))
        .collect();

    if !commands.is_empty() {
        deliver_with_retry(transport, &server, &commands, retry).await?;
    }

    tx.commit().await?;

    tracing::info!(
        server_id = server.id,
        subdomain = %server.subdomain,
        url = %server.photos_update_url,
        photos = commands.len(),
        "Registered photo server and resynced shard"
    );

    Ok((server, commands.len()))
}
