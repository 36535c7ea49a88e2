use std::future::Future;
use std::marker::PhantomData;

use log::{debug, warn};

use crate::{
    backend::{Entry, GuardedPut, KvBackend, TxnOutcome},
    errors::{StoreError, ValidationError},
    keys::KeyBuilder,
    query::query,
    resources::Resource,
    retry::Backoff,
    tenancy::TenancyContext,
};

/// CRUD operations for a single resource kind `T`.
pub struct ResourceStore<'a, T, B> {
    backend: &'a B,
    root: &'a str,
    retry: Option<Backoff>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T, B> ResourceStore<'a, T, B>
where
    T: Resource,
    B: KvBackend,
{
    pub(crate) fn new(backend: &'a B, root: &'a str, retry: Option<Backoff>) -> Self {
        Self {
            backend,
            root,
            retry,
            _marker: PhantomData,
        }
    }

    pub fn keys(&self) -> KeyBuilder<'a> {
        KeyBuilder::new(self.root, T::KIND, T::SCOPE)
    }

    /// Point read. A missing resource is `Ok(None)`, not an error.
    pub async fn get_by_name(&self, context: &TenancyContext, name: &str) -> Result<Option<T>, StoreError> {
        require_name(name)?;
        let keys = self.keys();
        let entries = self.attempt(|| query(self.backend, &keys, Some(context), Some(name))).await?;
        entries.into_iter().next().map(decode::<T>).transpose()
    }

    /// Every resource of this kind under `context`, in backend key order.
    pub async fn list(&self, context: &TenancyContext) -> Result<Vec<T>, StoreError> {
        let keys = self.keys();
        let entries = self.attempt(|| query(self.backend, &keys, Some(context), None)).await?;
        entries.into_iter().map(decode::<T>).collect()
    }

    /// Every resource of this kind across all tenants.
    pub async fn list_all(&self) -> Result<Vec<T>, StoreError> {
        let keys = self.keys();
        let entries = self.attempt(|| query(self.backend, &keys, None, None)).await?;
        entries.into_iter().map(decode::<T>).collect()
    }

    pub async fn exists(&self, context: &TenancyContext, name: &str) -> Result<bool, StoreError> {
        require_name(name)?;
        let key = self.keys().exact(context, name);
        Ok(self.attempt(|| self.backend.get(&key)).await?.is_some())
    }

    /// Unconditional delete; removing an absent resource succeeds.
    pub async fn delete(&self, context: &TenancyContext, name: &str) -> Result<(), StoreError> {
        require_name(name)?;
        let key = self.keys().exact(context, name);
        self.attempt(|| self.backend.delete(&key)).await
    }

    /// Writes a new resource. Fails if the parent scope is missing or the
    /// resource already exists.
    pub async fn create(&self, resource: &T) -> Result<(), StoreError> {
        self.write(resource, true).await
    }

    /// Creates or replaces a resource, provided its parent scope still exists.
    pub async fn update(&self, resource: &T) -> Result<(), StoreError> {
        self.write(resource, false).await
    }

    async fn write(&self, resource: &T, create: bool) -> Result<(), StoreError> {
        resource.validate()?;

        let tenancy = resource.tenancy();
        let keys = self.keys();
        let key = keys.exact(&tenancy, resource.name());
        let payload_json = serde_json::to_string(resource).map_err(|source| StoreError::Serialization {
            key: key.clone(),
            source,
        })?;

        let mut put = GuardedPut::new(keys.parent_marker(&tenancy), key, payload_json);
        if create {
            put = put.require_absent();
        }

        match self.attempt(|| self.backend.guarded_put(&put)).await? {
            TxnOutcome::Committed => {
                debug!("wrote {} '{}' at {}", T::KIND, resource.name(), put.key);
                Ok(())
            }
            TxnOutcome::GuardMissing { guard_key } => {
                warn!(
                    "rejected write of {} '{}': parent scope marker {} is missing",
                    T::KIND,
                    resource.name(),
                    guard_key
                );
                Err(StoreError::PreconditionFailed {
                    kind: T::KIND,
                    name: resource.name().to_string(),
                    scope: tenancy,
                })
            }
            TxnOutcome::KeyExists { key } => Err(StoreError::AlreadyExists { key }),
        }
    }

    async fn attempt<R, F, Fut>(&self, mut op: F) -> Result<R, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, StoreError>>,
    {
        match &self.retry {
            Some(backoff) => backoff.run(op).await,
            None => op().await,
        }
    }
}

fn require_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() {
        return Err(ValidationError::single("name", "validation.required", "must specify name").into());
    }
    Ok(())
}

fn decode<T: Resource>(entry: Entry) -> Result<T, StoreError> {
    serde_json::from_slice(&entry.value).map_err(|source| StoreError::Serialization { key: entry.key, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::MemoryBackend,
        resources::{CheckConfig, Environment, Organization},
        store::Store,
    };

    async fn seeded() -> Store<MemoryBackend> {
        let store = Store::new(MemoryBackend::new(), "/t");
        store.kind::<Organization>().create(&Organization::new("acme")).await.unwrap();
        store.kind::<Environment>().create(&Environment::new("acme", "prod")).await.unwrap();
        store
    }

    #[tokio::test]
    async fn writes_land_under_the_scoped_key() {
        let store = seeded().await;
        let check = CheckConfig::new("acme", "prod", "disk-check", "check-disk", 60);
        store.kind::<CheckConfig>().create(&check).await.unwrap();

        assert_eq!(store.backend().version("/t/checks/acme/prod/disk-check"), 1);
        assert_eq!(store.backend().version("/t/environments/acme/prod"), 1);
        assert_eq!(store.backend().version("/t/organizations/acme"), 1);
    }

    #[tokio::test]
    async fn empty_name_is_rejected_before_any_round_trip() {
        let store = seeded().await;
        let revision = store.backend().revision();
        let prod = TenancyContext::new("acme", "prod");

        let err = store.kind::<CheckConfig>().get_by_name(&prod, "").await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref v) if v.has_field("name")));
        let err = store.kind::<CheckConfig>().delete(&prod, "").await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.backend().revision(), revision);
    }

    #[tokio::test]
    async fn invalid_resource_never_reaches_the_backend() {
        let store = seeded().await;
        let revision = store.backend().revision();
        let check = CheckConfig::new("acme", "prod", "bad name!", "true", 0);

        let err = store.kind::<CheckConfig>().update(&check).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.backend().revision(), revision);
    }

    #[tokio::test]
    async fn corrupt_payload_reports_serialization_error() {
        let store = seeded().await;
        store.backend().put("/t/checks/acme/prod/broken", "{not json");
        let prod = TenancyContext::new("acme", "prod");

        let err = store.kind::<CheckConfig>().get_by_name(&prod, "broken").await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization { ref key, .. } if key == "/t/checks/acme/prod/broken"));
    }

    #[tokio::test]
    async fn environment_write_is_guarded_by_its_organization() {
        let store = Store::new(MemoryBackend::new(), "/t");
        let err = store
            .kind::<Environment>()
            .create(&Environment::new("ghost", "prod"))
            .await
            .unwrap_err();

        match err {
            StoreError::PreconditionFailed { kind, name, scope } => {
                assert_eq!(kind, "environments");
                assert_eq!(name, "prod");
                assert_eq!(scope, TenancyContext::organization("ghost"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.backend().is_empty());
    }

    #[tokio::test]
    async fn retry_policy_is_transparent_for_a_healthy_backend() {
        let store = seeded().await.with_retry(Backoff::default());
        let prod = TenancyContext::new("acme", "prod");
        let check = CheckConfig::new("acme", "prod", "cpu", "check-cpu", 30);

        store.kind::<CheckConfig>().create(&check).await.unwrap();
        assert!(store.kind::<CheckConfig>().exists(&prod, "cpu").await.unwrap());
        let err = store.kind::<CheckConfig>().create(&check).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }
}
