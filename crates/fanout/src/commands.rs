//! Wire format for photo-server update payloads.
//!
//! A push is a JSON array of commands; the only command today is `set`,
//! which maps a photo ID to its storage ID:
//!
//! ```json
//! [{"cmd": "set", "key": "<photo_id>", "value": "<storage_id>"}]
//! ```

use serde::{Deserialize, Serialize};

/// One `set` entry in the command list POSTed to a photo server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCommand {
    pub cmd: String,
    pub key: String,
    pub value: String,
}

impl SetCommand {
    /// Map `photo_id` to `storage_id` on the receiving server.
    pub fn set(photo_id: impl Into<String>, storage_id: impl Into<String>) -> Self {
        Self {
            cmd: "set".to_string(),
            key: photo_id.into(),
            value: storage_id.into(),
        }
    }
}
