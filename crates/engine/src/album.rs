//! Album creation and the mutation scope.
//!
//! Every client-observable album write happens inside an [`AlbumMutation`]:
//! one transaction, one revision bump at commit iff anything changed, and
//! events published only after the commit succeeds. Dropping a scope
//! without committing rolls everything back.

use lightbox_core::types::{DbId, Timestamp};
use lightbox_db::models::album::{Album, CreateAlbum};
use lightbox_db::models::album_member::CreateAlbumMember;
use lightbox_db::models::social::{
    CreatePhotoComment, CreatePhotoGlance, CreatePhotoUserTag, PhotoComment, PhotoGlance,
    PhotoUserTag,
};
use lightbox_db::models::user::{PhoneNumber, User};
use lightbox_db::repositories::album_member_repo::AlbumMemberRepo;
use lightbox_db::repositories::album_repo::AlbumRepo;
use lightbox_db::repositories::photo_repo::PhotoRepo;
use lightbox_db::repositories::social_repo::SocialRepo;
use lightbox_db::repositories::user_repo::UserRepo;
use lightbox_events::{AlbumEvent, AlbumEventKind, EventBus};
use sqlx::PgPool;

use crate::error::MutationError;

/// Outcome of adding a member by user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddMemberOutcome {
    /// A membership row was created.
    Added,
    /// The user was already a member; the existing row is untouched.
    AlreadyMember,
    /// No such user. A soft outcome so the rest of a batch can proceed.
    InvalidUserId,
}

/// Outcome of adding a member by phone number.
#[derive(Debug, Clone)]
pub struct PhoneMember {
    /// The resolved, possibly freshly created, phone identity.
    pub phone: PhoneNumber,
    /// Whether this call created the membership row.
    pub newly_added: bool,
}

/// Create an album at revision 0 with its creator as first member.
pub async fn create_album(
    pool: &PgPool,
    bus: &EventBus,
    create: &CreateAlbum,
    now: Timestamp,
) -> Result<Album, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let album = AlbumRepo::create(&mut tx, create, now).await?;
    let member = CreateAlbumMember {
        album_id: album.id,
        user_id: create.creator_id,
        added_by_user_id: create.creator_id,
    };
    AlbumMemberRepo::insert_if_absent(&mut tx, &member, now).await?;
    tx.commit().await?;

    tracing::info!(album_id = album.id, creator_id = create.creator_id, "Created album");
    bus.publish(AlbumEvent {
        album_id: album.id,
        actor_user_id: Some(create.creator_id),
        revision: album.revision_number,
        timestamp: now,
        kind: AlbumEventKind::AlbumCreated,
    });
    Ok(album)
}

/// Remove a user from an album in a mutation of its own.
///
/// The membership row is deleted; photos and comments the user authored
/// stay behind, still attributed to their user id. Returns whether a
/// membership actually existed — leaving an album twice is a no-op that
/// does not bump the revision.
pub async fn leave_album(
    pool: &PgPool,
    bus: &EventBus,
    album_id: DbId,
    user_id: DbId,
    now: Timestamp,
) -> Result<bool, MutationError> {
    let mut mutation = AlbumMutation::begin(pool, album_id, Some(user_id), now).await?;
    let left = mutation.remove_member(user_id).await?;
    mutation.commit(bus).await?;
    Ok(left)
}

// ---------------------------------------------------------------------------
// AlbumMutation
// ---------------------------------------------------------------------------

/// A transactional scope over one album.
///
/// Collects membership and per-photo interaction writes for one logical
/// request. [`commit`](Self::commit) bumps the album revision exactly once
/// iff any operation changed something, then publishes the buffered events
/// with the committed revision.
#[derive(Debug)]
pub struct AlbumMutation {
    tx: sqlx::Transaction<'static, sqlx::Postgres>,
    album: Album,
    actor_user_id: Option<DbId>,
    now: Timestamp,
    changed: bool,
    added_member_ids: Vec<DbId>,
    events: Vec<AlbumEventKind>,
}

impl AlbumMutation {
    /// Open a mutation scope on an existing album.
    pub async fn begin(
        pool: &PgPool,
        album_id: DbId,
        actor_user_id: Option<DbId>,
        now: Timestamp,
    ) -> Result<Self, MutationError> {
        let mut tx = pool.begin().await?;
        let album = AlbumRepo::find_by_id_in_tx(&mut tx, album_id)
            .await?
            .ok_or(MutationError::AlbumNotFound(album_id))?;
        Ok(Self {
            tx,
            album,
            actor_user_id,
            now,
            changed: false,
            added_member_ids: Vec::new(),
            events: Vec::new(),
        })
    }

    /// The album as it looked when the scope opened.
    pub fn album(&self) -> &Album {
        &self.album
    }

    /// Add a user to the album.
    ///
    /// An unknown user id is a soft [`AddMemberOutcome::InvalidUserId`], not
    /// an error: batch invites keep going past bad entries.
    pub async fn add_member_by_user_id(
        &mut self,
        user_id: DbId,
        added_by_user_id: DbId,
    ) -> Result<AddMemberOutcome, sqlx::Error> {
        if UserRepo::find_by_id_in_tx(&mut self.tx, user_id).await?.is_none() {
            tracing::warn!(
                album_id = self.album.id,
                user_id,
                "Cannot add unknown user to album"
            );
            return Ok(AddMemberOutcome::InvalidUserId);
        }

        let create = CreateAlbumMember {
            album_id: self.album.id,
            user_id,
            added_by_user_id,
        };
        match AlbumMemberRepo::insert_if_absent(&mut self.tx, &create, self.now).await? {
            Some(_) => {
                self.changed = true;
                self.added_member_ids.push(user_id);
                Ok(AddMemberOutcome::Added)
            }
            None => Ok(AddMemberOutcome::AlreadyMember),
        }
    }

    /// Add a member by phone number, inviting them if they are new.
    ///
    /// Resolves the number to a user, creating a placeholder user for an
    /// unknown number. The `invite` callback (the SMS collaborator seam)
    /// fires exactly once per phone number newly added to the album — never
    /// for someone who was already a member.
    pub async fn add_member_by_phone_number(
        &mut self,
        inviter: &User,
        phone_number: &str,
        nickname: &str,
        invite: &mut dyn FnMut(&User, &PhoneNumber, Timestamp),
    ) -> Result<PhoneMember, sqlx::Error> {
        let (phone, created_user) =
            UserRepo::get_or_create_by_phone(&mut self.tx, phone_number, nickname, self.now)
                .await?;
        if created_user {
            tracing::info!(
                album_id = self.album.id,
                user_id = phone.user_id,
                "Created placeholder user for phone invite"
            );
        }

        let create = CreateAlbumMember {
            album_id: self.album.id,
            user_id: phone.user_id,
            added_by_user_id: inviter.id,
        };
        let newly_added = AlbumMemberRepo::insert_if_absent(&mut self.tx, &create, self.now)
            .await?
            .is_some();
        if newly_added {
            self.changed = true;
            self.added_member_ids.push(phone.user_id);
            invite(inviter, &phone, self.now);
        }
        Ok(PhoneMember { phone, newly_added })
    }

    /// Remove a member. Returns `false` when no membership row existed.
    pub async fn remove_member(&mut self, user_id: DbId) -> Result<bool, sqlx::Error> {
        let removed = AlbumMemberRepo::delete(&mut self.tx, self.album.id, user_id).await?;
        if removed {
            self.changed = true;
            self.events.push(AlbumEventKind::MemberLeft { user_id });
        }
        Ok(removed)
    }

    /// Post a comment on a photo of this album.
    ///
    /// Returns `None` when the same (photo, author, client_msg_id) was
    /// already posted — a retried client request — which changes nothing.
    pub async fn post_comment(
        &mut self,
        create: &CreatePhotoComment,
    ) -> Result<Option<PhotoComment>, MutationError> {
        self.require_photo_in_album(&create.photo_id).await?;
        let inserted = SocialRepo::insert_comment_if_new(&mut self.tx, create, self.now).await?;
        if inserted.is_some() {
            self.changed = true;
        }
        Ok(inserted)
    }

    /// Delete a comment on one of this album's photos.
    pub async fn delete_comment(&mut self, comment_id: DbId) -> Result<bool, sqlx::Error> {
        let removed =
            SocialRepo::delete_comment_in_album(&mut self.tx, comment_id, self.album.id).await?;
        if removed {
            self.changed = true;
        }
        Ok(removed)
    }

    /// Tag a user on a photo of this album.
    ///
    /// Returns `None` when the user is already tagged on the photo.
    pub async fn tag_user(
        &mut self,
        create: &CreatePhotoUserTag,
    ) -> Result<Option<PhotoUserTag>, MutationError> {
        self.require_photo_in_album(&create.photo_id).await?;
        let inserted = SocialRepo::insert_tag_if_new(&mut self.tx, create, self.now).await?;
        if inserted.is_some() {
            self.changed = true;
        }
        Ok(inserted)
    }

    /// Remove a user tag from one of this album's photos.
    pub async fn remove_tag(&mut self, tag_id: DbId) -> Result<bool, sqlx::Error> {
        let removed = SocialRepo::delete_tag_in_album(&mut self.tx, tag_id, self.album.id).await?;
        if removed {
            self.changed = true;
        }
        Ok(removed)
    }

    /// Record a glance on a photo of this album.
    ///
    /// Always counts as a change: a repeat glance replaces the emoticon and
    /// refreshes its timestamp.
    pub async fn glance(
        &mut self,
        create: &CreatePhotoGlance,
    ) -> Result<PhotoGlance, MutationError> {
        self.require_photo_in_album(&create.photo_id).await?;
        let glance = SocialRepo::upsert_glance(&mut self.tx, create, self.now).await?;
        self.changed = true;
        Ok(glance)
    }

    /// Commit the scope.
    ///
    /// Bumps the revision exactly once iff anything changed, commits the
    /// transaction, and only then publishes the buffered events carrying
    /// the committed revision. Returns that revision (unchanged scopes
    /// return the revision the scope opened at).
    pub async fn commit(mut self, bus: &EventBus) -> Result<i64, sqlx::Error> {
        let revision = if self.changed {
            AlbumRepo::bump_revision(&mut self.tx, self.album.id, self.now).await?
        } else {
            self.album.revision_number
        };
        self.tx.commit().await?;

        if self.changed {
            tracing::info!(album_id = self.album.id, revision, "Committed album mutation");
        }

        let mut kinds = Vec::new();
        if !self.added_member_ids.is_empty() {
            kinds.push(AlbumEventKind::MembersAdded {
                member_user_ids: self.added_member_ids,
            });
        }
        kinds.extend(self.events);
        for kind in kinds {
            bus.publish(AlbumEvent {
                album_id: self.album.id,
                actor_user_id: self.actor_user_id,
                revision,
                timestamp: self.now,
                kind,
            });
        }
        Ok(revision)
    }

    async fn require_photo_in_album(&mut self, photo_id: &str) -> Result<(), MutationError> {
        match PhotoRepo::find_by_id_in_tx(&mut self.tx, photo_id).await? {
            Some(photo) if photo.album_id == self.album.id => Ok(()),
            _ => Err(MutationError::PhotoNotInAlbum {
                photo_id: photo_id.to_string(),
                album_id: self.album.id,
            }),
        }
    }
}
