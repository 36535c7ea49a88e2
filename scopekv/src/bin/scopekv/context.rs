use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use log::info;
use scopekv::{
    Backoff, Entry, KvBackend, MemoryBackend, RedisBackend, Store, StoreConfig, StoreError, TxnOutcome,
    backend::GuardedPut, config::DEFAULT_CONFIG_PATH,
};

use crate::output::OutputManager;

#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq)]
pub enum BackendKind {
    /// Redis at --url / REDIS_URL / the config file's backend.url
    #[default]
    Redis,
    /// In-process store that starts empty on every run and is dropped on
    /// exit; writes under a scope fail unless the same run created it
    Memory,
}

/// Connection settings collected from global flags.
#[derive(Clone, Debug, Default)]
pub struct ConnectOptions {
    pub config: Option<PathBuf>,
    pub backend: BackendKind,
    pub url: Option<String>,
    pub root: Option<String>,
}

/// Either backend the CLI can talk to.
#[derive(Clone)]
pub enum CliBackend {
    Redis(RedisBackend),
    Memory(MemoryBackend),
}

impl KvBackend for CliBackend {
    async fn get(&self, key: &str) -> Result<Option<Entry>, StoreError> {
        match self {
            CliBackend::Redis(backend) => backend.get(key).await,
            CliBackend::Memory(backend) => backend.get(key).await,
        }
    }

    async fn get_prefix(&self, prefix: &str) -> Result<Vec<Entry>, StoreError> {
        match self {
            CliBackend::Redis(backend) => backend.get_prefix(prefix).await,
            CliBackend::Memory(backend) => backend.get_prefix(prefix).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self {
            CliBackend::Redis(backend) => backend.delete(key).await,
            CliBackend::Memory(backend) => backend.delete(key).await,
        }
    }

    async fn guarded_put(&self, put: &GuardedPut) -> Result<TxnOutcome, StoreError> {
        match self {
            CliBackend::Redis(backend) => backend.guarded_put(put).await,
            CliBackend::Memory(backend) => backend.guarded_put(put).await,
        }
    }
}

impl ConnectOptions {
    fn load_config(&self) -> Result<StoreConfig> {
        match &self.config {
            Some(path) => StoreConfig::load(path).with_context(|| format!("Failed to load {}", path.display())),
            None => StoreConfig::load_or_default(DEFAULT_CONFIG_PATH).context("Failed to load config"),
        }
    }

    /// Opens the selected backend. Redis connects under the configured retry
    /// policy and gives up early on Ctrl-C.
    pub async fn open(&self, output: &OutputManager) -> Result<Store<CliBackend>> {
        let config = self.load_config()?;
        let root = self.root.clone().unwrap_or_else(|| config.root.clone());
        let backoff = config.backoff();

        let backend = match self.backend {
            BackendKind::Memory => {
                output.warning("In-memory backend starts empty; nothing persists past this command");
                CliBackend::Memory(MemoryBackend::new())
            }
            BackendKind::Redis => {
                let url = match &self.url {
                    Some(url) => url.clone(),
                    None => config
                        .backend_url()
                        .context("No backend URL. Pass --url or set REDIS_URL.")?,
                };
                output.progress("Connecting to Redis");
                let connected = connect_redis(&url, &backoff).await;
                output.clear_line();
                CliBackend::Redis(connected?)
            }
        };

        Ok(Store::new(backend, root).with_retry(backoff))
    }
}

async fn connect_redis(url: &str, backoff: &Backoff) -> Result<RedisBackend> {
    let cancel = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    let connected = backoff
        .run_until(|| async { RedisBackend::connect(url).await.map_err(StoreError::from) }, cancel)
        .await;

    match connected {
        Ok(backend) => {
            info!("connected to {url}");
            Ok(backend)
        }
        Err(StoreError::Cancelled) => anyhow::bail!("Interrupted while connecting to Redis"),
        Err(err) => Err(err).context("Failed to connect to Redis"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_help_says_it_starts_empty() {
        let value = BackendKind::Memory.to_possible_value().unwrap();
        let help = value.get_help().unwrap().to_string();
        assert!(help.contains("starts empty"), "{help}");
    }
}
