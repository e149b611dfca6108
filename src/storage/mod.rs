//! Storage implementations for different backends

pub mod file;
pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use file::FileTransactionStore;
pub use in_memory::InMemoryTransactionStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresTransactionStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::core::error::{ConfigError, NexusResult};
use crate::core::store::TransactionStore;
use std::sync::Arc;

/// Open the store selected by `config`.
///
/// Expects a validated config.
pub async fn open_store(config: &StorageConfig) -> NexusResult<Arc<dyn TransactionStore>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryTransactionStore::new())),
        StorageBackend::File => {
            let path = config.path.as_deref().ok_or_else(|| ConfigError::MissingField {
                field: "storage.path".to_string(),
                context: "file storage".to_string(),
            })?;
            let store = FileTransactionStore::open(path, config.storage_key.clone()).await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "postgres")]
        StorageBackend::Postgres => {
            let url = config.url.as_deref().ok_or_else(|| ConfigError::MissingField {
                field: "storage.url".to_string(),
                context: "postgres storage".to_string(),
            })?;
            let store = PostgresTransactionStore::connect(url, config.max_connections).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        StorageBackend::Postgres => Err(ConfigError::InvalidValue {
            field: "storage.backend".to_string(),
            value: config.backend.to_string(),
            message: "built without the 'postgres' feature".to_string(),
        }
        .into()),
    }
}
