//! Repository structs, one per table family.
//!
//! Methods take `&PgPool` for standalone statements. Operations that must
//! participate in a caller-owned transaction (revision bumps, photo commits,
//! membership writes) take `&mut sqlx::Transaction` instead, so the mutation
//! engine can compose them atomically.

pub mod album_member_repo;
pub mod album_repo;
pub mod pending_photo_repo;
pub mod photo_repo;
pub mod photo_server_repo;
pub mod social_repo;
pub mod user_repo;
