// Module declarations
pub mod clock;
pub mod persistence;
pub mod telemetry;

use application::{DocumentStore, StoreConfig};
use std::sync::Arc;
use tracing::info;

// Re-export all implementations
pub use clock::{ManualClock, SystemClock};
pub use persistence::InMemoryDocumentRepository;
pub use telemetry::{init_tracing, try_init_tracing};

/// Builds a store over a fresh in-memory repository and the system clock.
pub fn in_memory_store(config: StoreConfig) -> DocumentStore {
    let repository = Arc::new(InMemoryDocumentRepository::new());
    info!(author_match = %config.author_match, "In-memory document store initialized.");
    DocumentStore::new(repository, Arc::new(SystemClock), config)
}
