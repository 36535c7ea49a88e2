//! Resolves "one by name" versus "everything in scope" into a single backend read.

use crate::{
    backend::{Entry, KvBackend},
    errors::StoreError,
    keys::KeyBuilder,
    tenancy::TenancyContext,
};

/// Reads the raw entries matching `name` under `context`.
///
/// With a name this is a point read of the exact key (zero or one entry);
/// without one it is a prefix scan of the scope. Without a context the scan
/// covers every tenant of the kind.
pub async fn query<B>(
    backend: &B,
    keys: &KeyBuilder<'_>,
    context: Option<&TenancyContext>,
    name: Option<&str>,
) -> Result<Vec<Entry>, StoreError>
where
    B: KvBackend,
{
    match (context, name) {
        (Some(context), Some(name)) => Ok(backend.get(&keys.exact(context, name)).await?.into_iter().collect()),
        (context, _) => backend.get_prefix(&keys.build(context, None)).await,
    }
}
