//! File system paths for the gateway.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Manages file system paths for the gateway.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.sip2-gateway)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.sip2-gateway`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".sip2-gateway"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.sip2-gateway).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.sip2-gateway/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }
}
