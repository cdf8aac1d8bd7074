use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_API_BASE;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Directory for the local key-value state files
    pub data_dir: PathBuf,
    /// Base URL of the REST API
    pub api_base: String,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P, api_base: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            api_base: api_base.into(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new("murmur_data", DEFAULT_API_BASE)
    }
}
