//! Upload storage locations.
//!
//! A pending photo's raw bytes land in one of a configured set of buckets,
//! recorded in the database in a canonical `local:<dir>` / `s3:<bucket>`
//! form. [`StorageLocation`] is the typed view: the string is parsed once
//! at the database boundary and carried as a variant from then on, instead
//! of being re-split at every use site.

use std::fmt;
use std::str::FromStr;

/// Where a pending photo's uploaded bytes are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// A directory on the upload server's local filesystem.
    Local { directory: String },
    /// An S3 bucket name. Byte access itself is out of scope; the engine
    /// only tracks which bucket holds the upload.
    S3 { bucket: String },
}

/// Error returned when a stored bucket string has an unknown scheme.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown storage location: {0}")]
pub struct ParseStorageLocationError(pub String);

impl StorageLocation {
    /// The canonical string form written to the `pending_photos.bucket`
    /// column.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::Local { directory } => write!(f, "local:{directory}"),
            StorageLocation::S3 { bucket } => write!(f, "s3:{bucket}"),
        }
    }
}

impl FromStr for StorageLocation {
    type Err = ParseStorageLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("local", directory)) => Ok(StorageLocation::Local {
                directory: directory.to_string(),
            }),
            Some(("s3", bucket)) => Ok(StorageLocation::S3 {
                bucket: bucket.to_string(),
            }),
            _ => Err(ParseStorageLocationError(s.to_string())),
        }
    }
}
