//! Album mutation engine.
//!
//! All client-observable changes to an album flow through this crate
//! (upload slots, membership and interaction scopes, photo commits and
//! copies). Every committed mutation bumps the owning album's revision
//! counter exactly once, emits events on the
//! [`EventBus`](lightbox_events::EventBus) after commit, and hands new
//! photo mappings to the fan-out layer out-of-band.

pub mod album;
pub mod error;
pub mod photos;
pub mod tasks;
pub mod upload;

pub use album::{create_album, leave_album, AddMemberOutcome, AlbumMutation, PhoneMember};
pub use error::{AddPhotoError, MutationError, UploadError};
pub use photos::{commit_pending_photos, copy_photos};
