//! Repository for the `photo_servers` table.

use lightbox_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::photo_server::{PhotoServer, RegisterPhotoServer};

/// Column list for `photo_servers` queries.
const COLUMNS: &str = "id, subdomain, photos_update_url, auth_key, date_registered, unreachable";

/// Provides the photo-server registry consulted by the fan-out layer.
pub struct PhotoServerRepo;

impl PhotoServerRepo {
    /// Register a server, or refresh an existing registration keyed by its
    /// update URL. Re-registration clears the `unreachable` breaker.
    pub async fn upsert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        register: &RegisterPhotoServer,
        now: Timestamp,
    ) -> Result<PhotoServer, sqlx::Error> {
        let query = format!(
            "INSERT INTO photo_servers (subdomain, photos_update_url, auth_key, date_registered) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (photos_update_url) DO UPDATE SET \
                 subdomain = EXCLUDED.subdomain, \
                 auth_key = EXCLUDED.auth_key, \
                 date_registered = EXCLUDED.date_registered, \
                 unreachable = FALSE \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PhotoServer>(&query)
            .bind(&register.subdomain)
            .bind(&register.photos_update_url)
            .bind(&register.auth_key)
            .bind(now)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a registration by its update URL.
    pub async fn find_by_url(
        pool: &PgPool,
        photos_update_url: &str,
    ) -> Result<Option<PhotoServer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM photo_servers WHERE photos_update_url = $1");
        sqlx::query_as::<_, PhotoServer>(&query)
            .bind(photos_update_url)
            .fetch_optional(pool)
            .await
    }

    /// List servers for a shard that have not tripped the breaker.
    pub async fn list_reachable(
        pool: &PgPool,
        subdomain: &str,
    ) -> Result<Vec<PhotoServer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM photo_servers \
             WHERE subdomain = $1 AND NOT unreachable \
             ORDER BY id"
        );
        sqlx::query_as::<_, PhotoServer>(&query)
            .bind(subdomain)
            .fetch_all(pool)
            .await
    }

    /// Trip the breaker for a server after delivery retries are exhausted.
    ///
    /// Returns `true` if the flag changed.
    pub async fn mark_unreachable(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE photo_servers SET unreachable = TRUE WHERE id = $1 AND NOT unreachable")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
