//! Flight phase storage
//!
//! Phase rows are written through the [`PersistenceSink`] trait. The backend
//! is picked from `[storage]` in the config.

pub mod persistence;
mod sled_sink;

pub use persistence::{
    phase_key, InMemorySink, KeyScope, PersistenceError, PersistenceSink, SaveReport, StoredPhase,
};
pub use sled_sink::SledSink;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};

/// Open the configured backend.
pub fn open_sink(config: &StorageConfig) -> Result<Arc<dyn PersistenceSink>, PersistenceError> {
    let sink: Arc<dyn PersistenceSink> = match config.backend {
        StorageBackend::Sled => {
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PersistenceError::Storage(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
            Arc::new(SledSink::open(&config.path, config.key_scope)?)
        }
        StorageBackend::Memory => Arc::new(InMemorySink::new(config.key_scope)),
    };
    tracing::info!(backend = sink.backend_name(), scope = ?config.key_scope, "Storage ready");
    Ok(sink)
}
