//! User and phone-number identity models.
//!
//! A phone number resolves to exactly one user. Inviting a number that is
//! not yet registered creates a placeholder user the invitee later claims.

use lightbox_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub nickname: String,
    pub date_created: Timestamp,
}

/// DTO for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub nickname: String,
}

/// A row from the `phone_numbers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhoneNumber {
    pub id: DbId,
    pub phone_number: String,
    pub user_id: DbId,
    pub date_created: Timestamp,
    pub verified: bool,
}
