//! Committing pending photos into albums, and copying committed photos
//! between albums.
//!
//! Both operations share the same slot-assignment discipline: the next
//! `album_index` is `max + 1` read inside the committing transaction, each
//! insert runs in its own savepoint, and a unique violation on
//! (album_id, album_index) — a concurrent committer claimed the slot —
//! rolls back just that savepoint, re-reads the max, and retries. The
//! revision bumps once per transaction, only when at least one row landed.

use lightbox_core::config::EngineConfig;
use lightbox_core::ids;
use lightbox_core::types::{DbId, Timestamp};
use lightbox_db::models::pending_photo::PendingPhoto;
use lightbox_db::models::photo::{CreatePhoto, Photo};
use lightbox_db::repositories::album_repo::AlbumRepo;
use lightbox_db::repositories::pending_photo_repo::PendingPhotoRepo;
use lightbox_db::repositories::photo_repo::{self, PhotoRepo};
use lightbox_db::unique_violation;
use lightbox_events::{AddedPhoto, AlbumEvent, AlbumEventKind, EventBus};
use lightbox_fanout::{Replicator, SetCommand, ShardDelta};
use sqlx::{Acquire, PgPool};

use crate::error::AddPhotoError;
use crate::tasks;
use crate::upload::is_committable;

/// Commit a batch of pending photos into an album.
///
/// The whole batch is verified before anything is written: photos already
/// committed (here or elsewhere) are idempotent successes, ids that name
/// nothing are [`AddPhotoError::InvalidPhotoId`], uploads whose bytes never
/// arrived are [`AddPhotoError::PhotoNotUploaded`], and with remote
/// processing enabled an unprocessed upload is polled with bounded backoff
/// until the wait cap, then refused with
/// [`AddPhotoError::ProcessingTimeout`] — leaving no row behind.
///
/// Verified photos are then committed in one transaction: consecutive
/// `album_index` slots, a uniformly random serving shard each, the pending
/// rows deleted, and one revision bump. After the commit a `PhotosAdded`
/// event is published and the new mappings are handed to fan-out on a
/// detached task that can never fail the commit.
///
/// Returns the committed rows for every requested id, the previously
/// committed ones included.
pub async fn commit_pending_photos(
    pool: &PgPool,
    config: &EngineConfig,
    bus: &EventBus,
    replicator: &Replicator,
    album_id: DbId,
    photo_ids: &[String],
    now: Timestamp,
) -> Result<Vec<Photo>, AddPhotoError> {
    // Verify the whole batch up front; the first problem aborts before any
    // write happens.
    let mut already: Vec<Photo> = Vec::new();
    let mut to_commit: Vec<PendingPhoto> = Vec::new();
    for photo_id in photo_ids {
        if !ids::is_well_formed(photo_id) {
            return Err(AddPhotoError::InvalidPhotoId(photo_id.clone()));
        }
        if let Some(photo) = PhotoRepo::find_by_id(pool, photo_id).await? {
            already.push(photo);
            continue;
        }
        let pending = PendingPhotoRepo::find_by_id(pool, photo_id)
            .await?
            .ok_or_else(|| AddPhotoError::InvalidPhotoId(photo_id.clone()))?;
        if !pending.is_uploaded() {
            return Err(AddPhotoError::PhotoNotUploaded(photo_id.clone()));
        }
        if is_committable(&pending, config.processing) {
            to_commit.push(pending);
        } else {
            // Remote mode, upload done but processing still running.
            match wait_for_processing(pool, config, photo_id).await? {
                Some(pending) => to_commit.push(pending),
                None => {
                    // Committed by someone else while we waited.
                    if let Some(photo) = PhotoRepo::find_by_id(pool, photo_id).await? {
                        already.push(photo);
                    } else {
                        return Err(AddPhotoError::InvalidPhotoId(photo_id.clone()));
                    }
                }
            }
        }
    }
    if to_commit.is_empty() {
        return Ok(already);
    }

    let mut tx = pool.begin().await?;
    let mut next_index = PhotoRepo::max_album_index(&mut tx, album_id)
        .await?
        .map_or(0, |max| max + 1);
    let mut inserted: Vec<Photo> = Vec::new();

    for pending in &to_commit {
        loop {
            let create = CreatePhoto {
                photo_id: pending.photo_id.clone(),
                storage_id: pending.storage_id.clone(),
                subdomain: config.random_subdomain().to_string(),
                author_id: pending.author_id,
                album_id,
                album_index: next_index,
                copied_from_photo_id: None,
            };
            let mut sp = tx.begin().await?;
            match PhotoRepo::insert(&mut sp, &create, now).await {
                Ok(photo) => {
                    sp.commit().await?;
                    inserted.push(photo);
                    next_index += 1;
                    break;
                }
                Err(e) => {
                    sp.rollback().await?;
                    match unique_violation(&e) {
                        Some(c) if c == photo_repo::ALBUM_INDEX_CONSTRAINT => {
                            // A concurrent commit claimed the slot; pick up
                            // behind it and retry this photo.
                            next_index = PhotoRepo::max_album_index(&mut tx, album_id)
                                .await?
                                .map_or(0, |max| max + 1);
                        }
                        Some(c) if c == photo_repo::PHOTO_ID_CONSTRAINT => {
                            // The same photo was committed concurrently;
                            // that is a success, not a conflict.
                            match PhotoRepo::find_by_id_in_tx(&mut tx, &pending.photo_id).await? {
                                Some(photo) => already.push(photo),
                                None => return Err(e.into()),
                            }
                            break;
                        }
                        _ => return Err(e.into()),
                    }
                }
            }
        }
    }

    for photo in &inserted {
        PendingPhotoRepo::delete(&mut tx, &photo.photo_id).await?;
    }

    let revision = if inserted.is_empty() {
        None
    } else {
        Some(AlbumRepo::bump_revision(&mut tx, album_id, now).await?)
    };
    tx.commit().await?;

    if let Some(revision) = revision {
        tracing::info!(
            album_id,
            count = inserted.len(),
            revision,
            "Committed pending photos into album"
        );
        publish_and_fan_out(bus, replicator, album_id, revision, now, &inserted);
    }

    already.extend(inserted);
    Ok(already)
}

/// Copy committed photos into another album.
///
/// Slot and shard assignment work exactly as in
/// [`commit_pending_photos`]; the copy gets a freshly minted photo id,
/// shares the source's storage id, and records the source in
/// `copied_from_photo_id`. A source whose storage id was already copied
/// into the destination by the same author is skipped, so repeating a copy
/// yields no duplicate rows.
pub async fn copy_photos(
    pool: &PgPool,
    config: &EngineConfig,
    bus: &EventBus,
    replicator: &Replicator,
    author_id: DbId,
    source_photo_ids: &[String],
    dest_album_id: DbId,
    now: Timestamp,
) -> Result<Vec<Photo>, AddPhotoError> {
    for photo_id in source_photo_ids {
        if !ids::is_well_formed(photo_id) {
            return Err(AddPhotoError::InvalidPhotoId(photo_id.clone()));
        }
    }

    let mut tx = pool.begin().await?;
    let mut next_index = PhotoRepo::max_album_index(&mut tx, dest_album_id)
        .await?
        .map_or(0, |max| max + 1);
    let mut copies: Vec<Photo> = Vec::new();

    for source_id in source_photo_ids {
        let source = PhotoRepo::find_by_id_in_tx(&mut tx, source_id)
            .await?
            .ok_or_else(|| AddPhotoError::InvalidPhotoId(source_id.clone()))?;
        if PhotoRepo::copy_exists(&mut tx, dest_album_id, author_id, &source.storage_id).await? {
            tracing::debug!(
                source_photo_id = %source.photo_id,
                dest_album_id,
                "Copy already exists in destination album, skipping"
            );
            continue;
        }

        let mut photo_id = ids::generate_photo_id();
        loop {
            if PhotoRepo::find_by_id_in_tx(&mut tx, &photo_id).await?.is_some()
                || PendingPhotoRepo::find_by_id_in_tx(&mut tx, &photo_id).await?.is_some()
            {
                photo_id = ids::generate_photo_id();
                continue;
            }
            let create = CreatePhoto {
                photo_id: photo_id.clone(),
                storage_id: source.storage_id.clone(),
                subdomain: config.random_subdomain().to_string(),
                author_id,
                album_id: dest_album_id,
                album_index: next_index,
                copied_from_photo_id: Some(source.photo_id.clone()),
            };
            let mut sp = tx.begin().await?;
            match PhotoRepo::insert(&mut sp, &create, now).await {
                Ok(photo) => {
                    sp.commit().await?;
                    copies.push(photo);
                    next_index += 1;
                    break;
                }
                Err(e) => {
                    sp.rollback().await?;
                    match unique_violation(&e) {
                        Some(c) if c == photo_repo::ALBUM_INDEX_CONSTRAINT => {
                            next_index = PhotoRepo::max_album_index(&mut tx, dest_album_id)
                                .await?
                                .map_or(0, |max| max + 1);
                        }
                        Some(c) if c == photo_repo::PHOTO_ID_CONSTRAINT => {
                            // The freshly minted id lost a race; mint again.
                            photo_id = ids::generate_photo_id();
                        }
                        _ => return Err(e.into()),
                    }
                }
            }
        }
    }

    let revision = if copies.is_empty() {
        None
    } else {
        Some(AlbumRepo::bump_revision(&mut tx, dest_album_id, now).await?)
    };
    tx.commit().await?;

    if let Some(revision) = revision {
        tracing::info!(
            dest_album_id,
            count = copies.len(),
            revision,
            "Copied photos into album"
        );
        publish_and_fan_out(bus, replicator, dest_album_id, revision, now, &copies);
    }

    Ok(copies)
}

/// Publish `PhotosAdded` and hand the new mappings to fan-out on a
/// detached task. Fan-out is best-effort by contract: its failures are
/// logged by the replicator and never reach the committed mutation.
fn publish_and_fan_out(
    bus: &EventBus,
    replicator: &Replicator,
    album_id: DbId,
    revision: i64,
    now: Timestamp,
    photos: &[Photo],
) {
    bus.publish(AlbumEvent {
        album_id,
        actor_user_id: photos.first().map(|p| p.author_id),
        revision,
        timestamp: now,
        kind: AlbumEventKind::PhotosAdded {
            photos: photos
                .iter()
                .map(|p| AddedPhoto {
                    photo_id: p.photo_id.clone(),
                    storage_id: p.storage_id.clone(),
                    subdomain: p.subdomain.clone(),
                })
                .collect(),
        },
    });

    let deltas = group_by_subdomain(photos);
    let replicator = replicator.clone();
    tasks::spawn(async move {
        match replicator.replicate(&deltas).await {
            Ok(report) => {
                tracing::debug!(
                    album_id,
                    delivered = report.delivered,
                    tripped = report.tripped,
                    "Photo fan-out finished"
                );
            }
            Err(e) => {
                tracing::error!(album_id, error = %e, "Photo fan-out failed");
            }
        }
    })
    .detach();
}

/// Group committed photos into per-shard command batches.
fn group_by_subdomain(photos: &[Photo]) -> Vec<ShardDelta> {
    let mut deltas: Vec<ShardDelta> = Vec::new();
    for photo in photos {
        let command = SetCommand::set(&photo.photo_id, &photo.storage_id);
        match deltas.iter_mut().find(|d| d.subdomain == photo.subdomain) {
            Some(delta) => delta.commands.push(command),
            None => deltas.push(ShardDelta {
                subdomain: photo.subdomain.clone(),
                commands: vec![command],
            }),
        }
    }
    deltas
}

/// Poll a pending photo until processing completes, with doubling delays
/// bounded by the configured wait cap.
///
/// Returns `None` when the pending row disappeared because a concurrent
/// commit claimed it.
async fn wait_for_processing(
    pool: &PgPool,
    config: &EngineConfig,
    photo_id: &str,
) -> Result<Option<PendingPhoto>, AddPhotoError> {
    let deadline = tokio::time::Instant::now() + config.processing_wait_cap;
    let mut delay = config.processing_poll_initial;

    loop {
        match PendingPhotoRepo::find_by_id(pool, photo_id).await? {
            Some(pending) if pending.is_processed() => return Ok(Some(pending)),
            Some(_) => {}
            None => return Ok(None),
        }
        if tokio::time::Instant::now() + delay > deadline {
            tracing::warn!(photo_id, "Gave up waiting for photo processing");
            return Err(AddPhotoError::ProcessingTimeout(photo_id.to_string()));
        }
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(config.processing_poll_max);
    }
}
