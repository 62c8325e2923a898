//! Per-shard delta replication with circuit breaking.
//!
//! After an album mutation commits new photos, the engine groups them by
//! shard subdomain and hands the groups to [`Replicator::replicate`], which
//! pushes each group to every reachable server of that shard. Replication
//! is best-effort and eventually consistent: a server that exhausts its
//! retries has its `unreachable` breaker tripped and sees the photos again
//! only at its next registration resync.

use std::sync::Arc;

use lightbox_db::repositories::photo_server_repo::PhotoServerRepo;
use sqlx::PgPool;

use crate::commands::SetCommand;
use crate::retry::{deliver_with_retry, RetryConfig};
use crate::transport::UpdateTransport;

/// One shard's worth of new photo mappings.
#[derive(Debug, Clone)]
pub struct ShardDelta {
    pub subdomain: String,
    pub commands: Vec<SetCommand>,
}

/// Outcome of one replication pass, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Servers that acknowledged their delta.
    pub delivered: usize,
    /// Servers whose breaker tripped this pass.
    pub tripped: usize,
}

/// Pushes photo deltas to the photo-server fleet.
#[derive(Clone)]
pub struct Replicator {
    pool: PgPool,
    transport: Arc<dyn UpdateTransport>,
    retry: RetryConfig,
}

impl Replicator {
    pub fn new(pool: PgPool, transport: Arc<dyn UpdateTransport>, retry: RetryConfig) -> Self {
        Self { pool, transport, retry }
    }

    /// Push each delta to all reachable servers of its shard.
    ///
    /// Deliveries to the servers of one shard run concurrently. A server
    /// that exhausts its retries is marked unreachable and skipped by
    /// future passes until it re-registers.
    pub async fn replicate(&self, deltas: &[ShardDelta]) -> Result<FanoutReport, sqlx::Error> {
        let mut report = FanoutReport::default();

        for delta in deltas {
            if delta.commands.is_empty() {
                continue;
            }
            let servers = PhotoServerRepo::list_reachable(&self.pool, &delta.subdomain).await?;
            if servers.is_empty() {
                tracing::debug!(
                    subdomain = %delta.subdomain,
                    "No reachable photo servers for shard"
                );
                continue;
            }

            let results = futures::future::join_all(servers.iter().map(|server| {
                deliver_with_retry(self.transport.as_ref(), server, &delta.commands, &self.retry)
            }))
            .await;

            for (server, result) in servers.iter().zip(results) {
                match result {
                    Ok(()) => {
                        tracing::debug!(
                            server_id = server.id,
                            subdomain = %server.subdomain,
                            commands = delta.commands.len(),
                            "Delivered photo delta"
                        );
                        report.delivered += 1;
                    }
                    Err(e) => {
                        tracing::error!(
                            server_id = server.id,
                            subdomain = %server.subdomain,
                            url = %server.photos_update_url,
                            error = %e,
                            "Photo server unreachable after retries, tripping breaker"
                        );
                        PhotoServerRepo::mark_unreachable(&self.pool, server.id).await?;
                        report.tripped += 1;
                    }
                }
            }
        }

        Ok(report)
    }
}
