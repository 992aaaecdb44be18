//! Hosted store adapters implementing the post table and blob traits.

mod memory;
mod supabase;

use std::sync::Arc;

pub use memory::{MemoryStore, StoredBlob};
pub use supabase::SupabaseStore;

use crate::{
    application::repos::{BlobStore, PostsRepo},
    config::{StoreBackend, StoreSettings},
    infra::error::InfraError,
};

/// Table and blob handles backed by the same store.
#[derive(Clone)]
pub struct StoreHandles {
    pub posts: Arc<dyn PostsRepo>,
    pub blobs: Arc<dyn BlobStore>,
    /// Set when blobs live in process and the HTTP layer has to serve them.
    pub media: Option<Arc<MemoryStore>>,
}

impl StoreHandles {
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: PostsRepo + BlobStore + 'static,
    {
        Self {
            posts: store.clone(),
            blobs: store,
            media: None,
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            media: Some(store.clone()),
            ..Self::from_shared(store)
        }
    }
}

pub fn build(settings: &StoreSettings) -> Result<StoreHandles, InfraError> {
    match &settings.backend {
        StoreBackend::Memory => Ok(StoreHandles::in_memory(Arc::new(MemoryStore::new(
            settings.bucket.clone(),
        )))),
        StoreBackend::Supabase(supabase) => {
            let store = SupabaseStore::new(
                supabase,
                &settings.table,
                &settings.bucket,
                settings.request_timeout,
                settings.read_retries,
            )?;
            Ok(StoreHandles::from_shared(Arc::new(store)))
        }
    }
}
