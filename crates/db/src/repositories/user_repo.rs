//! Repository for the `users` and `phone_numbers` tables.

use lightbox_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, PhoneNumber, User};

/// Column list for `users` queries.
const USER_COLUMNS: &str = "id, nickname, date_created";

/// Column list for `phone_numbers` queries.
const PHONE_COLUMNS: &str = "id, phone_number, user_id, date_created, verified";

/// Provides user accounts and their phone-number identities.
pub struct UserRepo;

impl UserRepo {
    /// Create a user.
    pub async fn create(
        pool: &PgPool,
        create: &CreateUser,
        now: Timestamp,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (nickname, date_created) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&create.nickname)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by ID within an existing transaction.
    pub async fn find_by_id_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Find the identity row for a phone number.
    pub async fn find_phone_number(
        pool: &PgPool,
        phone_number: &str,
    ) -> Result<Option<PhoneNumber>, sqlx::Error> {
        let query = format!("SELECT {PHONE_COLUMNS} FROM phone_numbers WHERE phone_number = $1");
        sqlx::query_as::<_, PhoneNumber>(&query)
            .bind(phone_number)
            .fetch_optional(pool)
            .await
    }

    /// Resolve a phone number to its user, creating a placeholder user when
    /// the number is unknown.
    ///
    /// Returns the identity row plus `true` when a placeholder user was
    /// created. A concurrent insert of the same number is absorbed by the
    /// `ON CONFLICT DO NOTHING` and the committed row is re-read.
    pub async fn get_or_create_by_phone(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        phone_number: &str,
        nickname: &str,
        now: Timestamp,
    ) -> Result<(PhoneNumber, bool), sqlx::Error> {
        let select = format!("SELECT {PHONE_COLUMNS} FROM phone_numbers WHERE phone_number = $1");

        if let Some(existing) = sqlx::query_as::<_, PhoneNumber>(&select)
            .bind(phone_number)
            .fetch_optional(&mut **tx)
            .await?
        {
            return Ok((existing, false));
        }

        let user_query = format!(
            "INSERT INTO users (nickname, date_created) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&user_query)
            .bind(nickname)
            .bind(now)
            .fetch_one(&mut **tx)
            .await?;

        let insert = format!(
            "INSERT INTO phone_numbers (phone_number, user_id, date_created, verified) \
             VALUES ($1, $2, $3, FALSE) \
             ON CONFLICT (phone_number) DO NOTHING \
             RETURNING {PHONE_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, PhoneNumber>(&insert)
            .bind(phone_number)
            .bind(user.id)
            .bind(now)
            .fetch_optional(&mut **tx)
            .await?;

        match inserted {
            Some(row) => Ok((row, true)),
            // Lost a race with a concurrent registration of the same number.
            // Drop the placeholder user minted above; it is referenced by
            // nothing yet.
            None => {
                sqlx::query("DELETE FROM users WHERE id = $1")
                    .bind(user.id)
                    .execute(&mut **tx)
                    .await?;
                let row = sqlx::query_as::<_, PhoneNumber>(&select)
                    .bind(phone_number)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok((row, false))
            }
        }
    }
}
