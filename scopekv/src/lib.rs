//! Multi-tenant configuration store.
//!
//! Resources are namespaced by organization and environment and persisted as
//! JSON under hierarchical keys. Every write is a single backend transaction
//! that first checks the owning scope still exists, so a deleted environment
//! cannot be repopulated by a racing writer.

extern crate self as scopekv;

pub mod backend;
pub mod config;
pub mod errors;
pub mod keys;
pub mod query;
pub mod resources;
pub mod retry;
pub mod store;
pub mod tenancy;
pub mod transport;
pub mod validators;

pub use backend::{Entry, KvBackend, MemoryBackend, RedisBackend, TxnOutcome};
pub use config::StoreConfig;
pub use errors::*;
pub use keys::KeyBuilder;
pub use resources::{CheckConfig, Environment, Organization, Resource};
pub use retry::Backoff;
pub use scopekv_macros::ConfigResource;
pub use store::{ResourceStore, Store};
pub use tenancy::{ScopeLevel, TenancyContext};

// Re-export redis types so users don't need to depend on a specific redis version
pub use redis;
pub use redis::aio::ConnectionManager;
