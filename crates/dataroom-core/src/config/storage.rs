//! Upload and blob storage configuration.

use serde::{Deserialize, Serialize};

/// Storage limits applied at the upload surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Maximum upload size in bytes (default 100 MB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_upload_size_bytes: default_max_upload(),
        }
    }
}

fn default_max_upload() -> u64 {
    104_857_600 // 100 MB
}
