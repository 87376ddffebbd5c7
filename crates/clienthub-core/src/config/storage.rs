//! Document storage configuration.
//!
//! Uploaded files are written to a bucket. The bucket is either a directory on
//! local disk or, for development and tests, process memory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Bucket name, used as the top-level directory for the local backend.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Root directory for the local backend.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files on local disk under `directory/bucket`.
    #[default]
    Local,
    /// In-process memory; contents are lost on restart.
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: default_bucket(),
            directory: default_directory(),
        }
    }
}

impl StorageConfig {
    /// Directory holding the bucket's objects for the local backend.
    pub fn bucket_root(&self) -> PathBuf {
        self.directory.join(&self.bucket)
    }
}

fn default_bucket() -> String {
    "documents".to_string()
}

fn default_directory() -> PathBuf {
    PathBuf::from("data/storage")
}
