//! Engine configuration.
//!
//! The feature switches the engine needs (which shard subdomains exist,
//! where uploads land, whether remote photo processing is in use) are
//! carried in an explicit [`EngineConfig`] value handed to the mutation
//! engine, never read from ambient global state.

use std::time::Duration;

use rand::Rng;

use crate::storage::StorageLocation;

/// Whether uploaded photos pass through a remote processing step before
/// they may be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Uploads are served locally; a photo is committable as soon as its
    /// file is uploaded.
    Local,
    /// A remote processor produces renditions; a photo is committable only
    /// after processing-done is recorded.
    Remote,
}

/// Configuration for the album mutation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Shard subdomains a newly committed photo may be assigned to.
    /// Assignment is uniformly random over this set.
    pub photo_subdomains: Vec<String>,
    /// Buckets an upload slot may be placed in, chosen uniformly at random.
    pub upload_buckets: Vec<StorageLocation>,
    /// Local vs. remote processing (see [`ProcessingMode`]).
    pub processing: ProcessingMode,
    /// First delay when polling a pending photo for processing completion.
    pub processing_poll_initial: Duration,
    /// Upper bound on a single processing poll delay.
    pub processing_poll_max: Duration,
    /// Total time to wait for processing before giving up with a fatal
    /// timeout (default: 10 minutes).
    pub processing_wait_cap: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            photo_subdomains: vec![
                "photos01".into(),
                "photos02".into(),
                "photos03".into(),
                "photos04".into(),
            ],
            upload_buckets: vec![StorageLocation::Local {
                directory: "photo-uploads".into(),
            }],
            processing: ProcessingMode::Local,
            processing_poll_initial: Duration::from_secs(5),
            processing_poll_max: Duration::from_secs(60),
            processing_wait_cap: Duration::from_secs(600),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                               |
    /// |----------------------------|---------------------------------------|
    /// | `PHOTO_SUBDOMAINS`         | `photos01,photos02,photos03,photos04` |
    /// | `UPLOAD_BUCKETS`           | `local:photo-uploads`                 |
    /// | `PHOTO_PROCESSING`         | `local`                               |
    /// | `PROCESSING_WAIT_CAP_SECS` | `600`                                 |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let photo_subdomains = match std::env::var("PHOTO_SUBDOMAINS") {
            Ok(raw) => split_csv(&raw),
            Err(_) => defaults.photo_subdomains,
        };

        let upload_buckets = match std::env::var("UPLOAD_BUCKETS") {
            Ok(raw) => split_csv(&raw)
                .iter()
                .map(|s| s.parse().expect("UPLOAD_BUCKETS entries must be local:<dir> or s3:<bucket>"))
                .collect(),
            Err(_) => defaults.upload_buckets,
        };

        let processing = match std::env::var("PHOTO_PROCESSING").as_deref() {
            Ok("remote") => ProcessingMode::Remote,
            Ok("local") | Err(_) => ProcessingMode::Local,
            Ok(other) => panic!("PHOTO_PROCESSING must be 'local' or 'remote', got '{other}'"),
        };

        let processing_wait_cap = std::env::var("PROCESSING_WAIT_CAP_SECS")
            .ok()
            .map(|v| {
                Duration::from_secs(
                    v.parse().expect("PROCESSING_WAIT_CAP_SECS must be a valid u64"),
                )
            })
            .unwrap_or(defaults.processing_wait_cap);

        assert!(
            !photo_subdomains.is_empty(),
            "PHOTO_SUBDOMAINS must name at least one shard"
        );
        assert!(
            !upload_buckets.is_empty(),
            "UPLOAD_BUCKETS must name at least one bucket"
        );

        Self {
            photo_subdomains,
            upload_buckets,
            processing,
            processing_poll_initial: defaults.processing_poll_initial,
            processing_poll_max: defaults.processing_poll_max,
            processing_wait_cap,
        }
    }

    /// Pick a serving shard for a newly committed photo, uniformly at
    /// random.
    ///
    /// Panics on an empty shard list; [`EngineConfig::from_env`] and
    /// [`Default`] guarantee at least one entry.
    pub fn random_subdomain(&self) -> &str {
        let i = rand::rng().random_range(0..self.photo_subdomains.len());
        &self.photo_subdomains[i]
    }

    /// Pick a bucket for a new upload slot, uniformly at random.
    ///
    /// Panics on an empty bucket list; [`EngineConfig::from_env`] and
    /// [`Default`] guarantee at least one entry.
    pub fn random_upload_bucket(&self) -> &StorageLocation {
        let i = rand::rng().random_range(0..self.upload_buckets.len());
        &self.upload_buckets[i]
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
