//! Audit storage backends.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tenantsql_core::{AuditConfig, StorageBackend};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::logger::AuditFilter;

/// Trait for audit storage backends.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Store an audit event.
    async fn store(&self, event: AuditEvent) -> Result<(), AuditError>;

    /// Query stored events. Write-only backends return nothing.
    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError>;
}

/// Create a storage backend based on configuration.
pub fn create_storage(config: &AuditConfig) -> Result<Box<dyn AuditStorage>, AuditError> {
    if !config.enabled {
        return Ok(Box::new(NullStorage));
    }
    match config.storage {
        StorageBackend::Console => Ok(Box::new(ConsoleStorage)),
        StorageBackend::File => {
            let path = config.file_path.as_deref().ok_or_else(|| {
                AuditError::InitializationFailed(
                    "file storage requires audit.file_path".to_string(),
                )
            })?;
            Ok(Box::new(FileStorage::new(path)))
        }
        StorageBackend::Null => Ok(Box::new(NullStorage)),
    }
}

/// Console storage (human-readable lines on stderr, clear of command output).
pub struct ConsoleStorage;

#[async_trait]
impl AuditStorage for ConsoleStorage {
    async fn store(&self, event: AuditEvent) -> Result<(), AuditError> {
        eprintln!("{}", event.to_log_line());
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        Ok(vec![])
    }
}

/// File storage (JSON Lines, one event per line).
pub struct FileStorage {
    path: PathBuf,
    // Serializes appends so concurrent events never interleave.
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditStorage for FileStorage {
    async fn store(&self, event: AuditEvent) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut results = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let event: AuditEvent = serde_json::from_str(line)?;
            if filter.matches(&event) {
                results.push(event);
            }
        }
        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }
        Ok(results)
    }
}

/// Discards every event.
pub struct NullStorage;

#[async_trait]
impl AuditStorage for NullStorage {
    async fn store(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        Ok(vec![])
    }
}
