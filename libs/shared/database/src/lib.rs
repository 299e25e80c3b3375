pub mod memory;
pub mod store;
pub mod supabase;

use std::sync::Arc;

use shared_config::{AppConfig, StoreBackend};
use tracing::info;

pub use memory::InMemoryStore;
pub use store::{CapacityGuard, Document, DocumentStore, Filter, StoreError};
pub use supabase::{SupabaseClient, SupabaseStore};

/// Build the directory store selected by configuration.
pub fn store_from_config(config: &AppConfig) -> Arc<dyn DocumentStore> {
    match config.store_backend {
        StoreBackend::Supabase => {
            info!("Using hosted directory store at {}", config.supabase_url);
            Arc::new(SupabaseStore::new(SupabaseClient::new(config)))
        }
        StoreBackend::Memory => {
            info!("Using in-memory directory store");
            Arc::new(InMemoryStore::new())
        }
    }
}
