//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts

pub mod album;
pub mod album_member;
pub mod pending_photo;
pub mod photo;
pub mod photo_server;
pub mod social;
pub mod user;
