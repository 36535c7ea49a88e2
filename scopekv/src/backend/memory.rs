use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::{
    backend::{Entry, GuardedPut, KvBackend, TxnOutcome},
    errors::StoreError,
};

#[derive(Debug, Clone)]
struct Versioned {
    value: Vec<u8>,
    /// Number of writes since the key was last created; zero means absent.
    version: u64,
}

#[derive(Debug, Default)]
struct State {
    revision: u64,
    entries: BTreeMap<String, Versioned>,
}

/// In-process backend with etcd-like per-key versions.
///
/// Clones share the same underlying map, so a test can hand one clone to a
/// store and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Version of `key`: zero when absent, incremented on every write.
    pub fn version(&self, key: &str) -> u64 {
        self.lock().entries.get(key).map(|entry| entry.version).unwrap_or(0)
    }

    /// Store-wide revision, bumped by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unconditional put, for seeding fixtures outside the store.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        put_locked(&mut state, key.into(), value.into());
    }
}

fn put_locked(state: &mut State, key: String, value: Vec<u8>) {
    state.revision += 1;
    let entry = state.entries.entry(key).or_insert(Versioned {
        value: Vec::new(),
        version: 0,
    });
    entry.value = value;
    entry.version += 1;
}

impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Entry>, StoreError> {
        debug!("GET {key}");
        Ok(self
            .lock()
            .entries
            .get(key)
            .map(|entry| Entry::new(key, entry.value.clone())))
    }

    async fn get_prefix(&self, prefix: &str) -> Result<Vec<Entry>, StoreError> {
        debug!("RANGE {prefix}*");
        let state = self.lock();
        Ok(state
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, entry)| Entry::new(key.clone(), entry.value.clone()))
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        debug!("DEL {key}");
        let mut state = self.lock();
        if state.entries.remove(key).is_some() {
            state.revision += 1;
        }
        Ok(())
    }

    async fn guarded_put(&self, put: &GuardedPut) -> Result<TxnOutcome, StoreError> {
        debug!("TXN if version({:?}) > 0 then PUT {}", put.guard_key, put.key);
        let mut state = self.lock();

        if let Some(guard_key) = &put.guard_key {
            let guard_version = state.entries.get(guard_key).map(|entry| entry.version).unwrap_or(0);
            if guard_version == 0 {
                return Ok(TxnOutcome::GuardMissing {
                    guard_key: guard_key.clone(),
                });
            }
        }

        if put.require_absent && state.entries.contains_key(&put.key) {
            return Ok(TxnOutcome::KeyExists { key: put.key.clone() });
        }

        put_locked(&mut state, put.key.clone(), put.payload_json.clone().into_bytes());
        Ok(TxnOutcome::Committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn versions_grow_and_reset_on_delete() {
        let backend = MemoryBackend::new();
        backend.put("/a", "1");
        backend.put("/a", "2");
        assert_eq!(backend.version("/a"), 2);

        backend.delete("/a").await.unwrap();
        assert_eq!(backend.version("/a"), 0);
        assert!(backend.get("/a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prefix_reads_stop_at_prefix_boundary() {
        let backend = MemoryBackend::new();
        backend.put("/c/acme/prod/a", "1");
        backend.put("/c/acme/prod/b", "2");
        backend.put("/c/acme/production/c", "3");

        let keys: Vec<String> = backend
            .get_prefix("/c/acme/prod/")
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.key)
            .collect();
        assert_eq!(keys, vec!["/c/acme/prod/a", "/c/acme/prod/b"]);
    }

    #[tokio::test]
    async fn guarded_put_leaves_no_partial_write() {
        let backend = MemoryBackend::new();
        let put = GuardedPut::new(Some("/env".into()), "/k", "{}");

        let outcome = backend.guarded_put(&put).await.unwrap();
        assert_eq!(outcome, TxnOutcome::GuardMissing { guard_key: "/env".into() });
        assert!(backend.is_empty());
        assert_eq!(backend.revision(), 0);

        backend.put("/env", "{}");
        assert!(backend.guarded_put(&put).await.unwrap().succeeded());
        assert_eq!(backend.version("/k"), 1);
    }

    #[tokio::test]
    async fn require_absent_rejects_existing_keys() {
        let backend = MemoryBackend::new();
        let put = GuardedPut::new(None, "/k", "{}").require_absent();
        assert!(backend.guarded_put(&put).await.unwrap().succeeded());
        assert_eq!(
            backend.guarded_put(&put).await.unwrap(),
            TxnOutcome::KeyExists { key: "/k".into() }
        );
    }
}
