//! Backend key-value protocol.
//!
//! The store only needs point reads, prefix reads, deletes, and a transaction
//! with a single existence guard in front of a single put. Anything offering
//! those can implement [`KvBackend`].

pub mod commands;
pub mod memory;
pub mod redis_backend;
pub mod scripts;

pub use commands::GuardedPut;
pub use memory::MemoryBackend;
pub use redis_backend::RedisBackend;

use crate::errors::StoreError;

/// A raw key/value pair as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: Vec<u8>,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Result of evaluating a [`GuardedPut`] transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnOutcome {
    /// The condition held and the put was applied.
    Committed,
    /// The guard key had no live version; nothing was written.
    GuardMissing { guard_key: String },
    /// `require_absent` was set and the target key already exists; nothing was written.
    KeyExists { key: String },
}

impl TxnOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, TxnOutcome::Committed)
    }
}

#[allow(async_fn_in_trait)]
pub trait KvBackend {
    /// Point read. Absence is `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<Entry>, StoreError>;

    /// All entries whose key starts with `prefix`, in key order.
    async fn get_prefix(&self, prefix: &str) -> Result<Vec<Entry>, StoreError>;

    /// Unconditional delete. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Evaluates the guard and applies the put as one indivisible step.
    async fn guarded_put(&self, put: &GuardedPut) -> Result<TxnOutcome, StoreError>;
}
