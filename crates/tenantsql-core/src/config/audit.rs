//! Audit logging configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for audit logging of rewrite outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit logging is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Whether successful rewrites are recorded, not only rejections.
    #[serde(default)]
    pub log_rewrites: bool,

    /// Storage backend.
    #[serde(default)]
    pub storage: StorageBackend,

    /// File path (for file backend).
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

/// Storage backend type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Log to stderr.
    #[default]
    Console,
    /// Append JSON Lines to a file.
    File,
    /// Discard events.
    Null,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            log_rewrites: false,
            storage: StorageBackend::default(),
            file_path: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}
