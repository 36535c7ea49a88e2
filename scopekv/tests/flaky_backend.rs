//! Retry behaviour of the store when the backend drops requests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use scopekv::{
    Backoff, CheckConfig, Entry, Environment, KvBackend, MemoryBackend, Organization, Store, StoreError,
    TenancyContext, TxnOutcome, backend::GuardedPut,
};

/// Fails the next `failures` calls with a transport error, then delegates.
struct FlakyBackend {
    inner: MemoryBackend,
    failures: AtomicU32,
    calls: AtomicU32,
}

impl FlakyBackend {
    fn new(inner: MemoryBackend) -> Self {
        Self {
            inner,
            failures: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }

    fn fail_next(&self, failures: u32) {
        self.failures.store(failures, Ordering::SeqCst);
        self.calls.store(0, Ordering::SeqCst);
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn trip(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Transport(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection reset",
            ))));
        }
        Ok(())
    }
}

impl KvBackend for FlakyBackend {
    async fn get(&self, key: &str) -> Result<Option<Entry>, StoreError> {
        self.trip()?;
        self.inner.get(key).await
    }

    async fn get_prefix(&self, prefix: &str) -> Result<Vec<Entry>, StoreError> {
        self.trip()?;
        self.inner.get_prefix(prefix).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.trip()?;
        self.inner.delete(key).await
    }

    async fn guarded_put(&self, put: &GuardedPut) -> Result<TxnOutcome, StoreError> {
        self.trip()?;
        self.inner.guarded_put(put).await
    }
}

fn backoff(max_attempts: u32) -> Backoff {
    Backoff::new(Duration::from_millis(10), Duration::from_secs(1), max_attempts, 2.0)
}

async fn scoped_store(max_attempts: u32) -> Store<FlakyBackend> {
    let memory = MemoryBackend::new();
    let seed = Store::new(memory.clone(), "/flaky");
    seed.kind::<Organization>().create(&Organization::new("acme")).await.unwrap();
    seed.kind::<Environment>().create(&Environment::new("acme", "prod")).await.unwrap();
    Store::new(FlakyBackend::new(memory), "/flaky").with_retry(backoff(max_attempts))
}

fn check() -> CheckConfig {
    CheckConfig::new("acme", "prod", "disk-check", "check-disk", 60)
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried() {
    let store = scoped_store(5).await;
    let prod = TenancyContext::new("acme", "prod");

    store.backend().fail_next(2);
    store.kind::<CheckConfig>().create(&check()).await.unwrap();
    assert_eq!(store.backend().calls(), 3);

    store.backend().fail_next(4);
    let listed = store.kind::<CheckConfig>().list(&prod).await.unwrap();
    assert_eq!(listed, vec![check()]);
    assert_eq!(store.backend().calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn precondition_failure_is_not_retried() {
    let store = scoped_store(5).await;
    store.backend().fail_next(0);

    let orphan = CheckConfig::new("acme", "staging", "disk-check", "check-disk", 60);
    let err = store.kind::<CheckConfig>().update(&orphan).await.unwrap_err();
    assert!(err.is_precondition_failed());
    assert_eq!(store.backend().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_policy_surfaces_max_attempts() {
    let store = scoped_store(3).await;
    store.backend().fail_next(10);

    let err = store.kind::<CheckConfig>().create(&check()).await.unwrap_err();
    assert!(matches!(err, StoreError::MaxRetryAttempts { attempts: 3 }), "unexpected error: {err:?}");
    assert_eq!(store.backend().calls(), 3);
}

#[tokio::test]
async fn without_a_policy_transport_errors_surface_directly() {
    let memory = MemoryBackend::new();
    let store = Store::new(FlakyBackend::new(memory), "/flaky");
    store.backend().fail_next(1);

    let err = store
        .kind::<CheckConfig>()
        .delete(&TenancyContext::new("acme", "prod"), "disk-check")
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}
