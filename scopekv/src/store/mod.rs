//! CRUD engine over a [`KvBackend`].
//!
//! # Example
//! ```ignore
//! let store = Store::new(RedisBackend::connect("redis://127.0.0.1/").await?, "/scopekv");
//! let prod = TenancyContext::new("acme", "prod");
//!
//! store.kind::<Organization>().create(&Organization::new("acme")).await?;
//! store.kind::<Environment>().create(&Environment::new("acme", "prod")).await?;
//! store.kind::<CheckConfig>().create(&check).await?;
//! let check = store.kind::<CheckConfig>().get_by_name(&prod, "disk-check").await?;
//! ```

mod resource;

pub use resource::ResourceStore;

use crate::{backend::KvBackend, keys::DEFAULT_ROOT, resources::Resource, retry::Backoff};

/// Entry point for store operations; cheap to share by reference.
///
/// Holds no mutable state of its own. Concurrent callers are serialized only
/// by the backend's transactional semantics.
#[derive(Debug, Clone)]
pub struct Store<B> {
    backend: B,
    root: String,
    retry: Option<Backoff>,
}

impl<B: KvBackend> Store<B> {
    /// Create a store rooted at `root` (for example `/scopekv`).
    pub fn new(backend: B, root: impl Into<String>) -> Self {
        Self {
            backend,
            root: root.into(),
            retry: None,
        }
    }

    pub fn with_default_root(backend: B) -> Self {
        Self::new(backend, DEFAULT_ROOT)
    }

    /// Retry every operation under `backoff` when the backend is unavailable.
    pub fn with_retry(mut self, backoff: Backoff) -> Self {
        self.retry = Some(backoff);
        self
    }

    /// Get a type-safe handle for one resource kind.
    pub fn kind<T: Resource>(&self) -> ResourceStore<'_, T, B> {
        ResourceStore::new(&self.backend, &self.root, self.retry)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn retry_policy(&self) -> Option<&Backoff> {
        self.retry.as_ref()
    }
}
