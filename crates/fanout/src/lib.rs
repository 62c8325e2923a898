//! Photo-server replication.
//!
//! Committed photos are served by external photo servers, one fleet per
//! shard subdomain. This crate keeps those servers informed:
//!
//! - [`commands`] — the JSON set-command wire format.
//! - [`transport`] — the [`UpdateTransport`] seam and its reqwest
//!   implementation.
//! - [`retry`] — exponential-backoff delivery around a transport.
//! - [`replicator`] — per-shard delta push with circuit breaking.
//! - [`registration`] — photo-server registration and full resync.
//!
//! Delta replication is best-effort: a server that exhausts its retries has
//! its `unreachable` breaker tripped and is skipped until it re-registers.

pub mod commands;
pub mod registration;
pub mod replicator;
pub mod retry;
pub mod transport;

pub use commands::SetCommand;
pub use registration::{register_photo_server, RegistrationError};
pub use replicator::{FanoutReport, Replicator, ShardDelta};
pub use retry::RetryConfig;
pub use transport::{HttpTransport, TransportError, UpdateTransport};
