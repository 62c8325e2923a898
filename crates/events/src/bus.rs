//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`AlbumEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use lightbox_core::types::{DbId, Timestamp};
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// AlbumEvent
// ---------------------------------------------------------------------------

/// A committed change to an album.
///
/// Events are published after the mutating transaction commits, so
/// `revision` is the value a reader would observe when refetching.
#[derive(Debug, Clone, Serialize)]
pub struct AlbumEvent {
    /// Album the change applies to.
    pub album_id: DbId,

    /// User that triggered the mutation, when known.
    pub actor_user_id: Option<DbId>,

    /// Album revision after the mutation committed.
    pub revision: i64,

    /// When the mutation was applied (UTC).
    pub timestamp: Timestamp,

    /// What changed.
    pub kind: AlbumEventKind,
}

/// The change a committed mutation made.
#[derive(Debug, Clone, Serialize)]
pub enum AlbumEventKind {
    /// A new album came into existence with its creator as first member.
    AlbumCreated,

    /// Users joined the album. Only newly created memberships are listed;
    /// double-adds of existing members do not appear.
    MembersAdded { member_user_ids: Vec<DbId> },

    /// A member left the album of their own accord.
    MemberLeft { user_id: DbId },

    /// Photos were committed into the album, in `album_index` order.
    PhotosAdded { photos: Vec<AddedPhoto> },
}

/// Minimal description of one committed photo, enough for a subscriber to
/// reference it without a database round trip.
#[derive(Debug, Clone, Serialize)]
pub struct AddedPhoto {
    pub photo_id: String,
    pub storage_id: String,
    pub subdomain: String,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`AlbumEvent`].
pub struct EventBus {
    sender: broadcast::Sender<AlbumEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: AlbumEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<AlbumEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
