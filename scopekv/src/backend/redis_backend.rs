use std::borrow::Cow;

use log::debug;
use redis::{aio::ConnectionManager, cmd};
use serde_json::Value;

use crate::{
    backend::{Entry, GuardedPut, KvBackend, TxnOutcome, scripts::GUARDED_PUT_SCRIPT},
    errors::StoreError,
};

const SCAN_COUNT: usize = 1000;

/// Redis-backed implementation of the store's backend protocol.
///
/// The connection manager is cloned per request; clones share one multiplexed
/// connection, so the backend can be shared freely between callers.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Opens a managed connection to the given Redis URL.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn))
    }

    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

impl KvBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Entry>, StoreError> {
        debug!("GET {key}");
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value.map(|value| Entry::new(key, value)))
    }

    async fn get_prefix(&self, prefix: &str) -> Result<Vec<Entry>, StoreError> {
        debug!("SCAN {prefix}*");
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", escape_glob(prefix));
        let mut cursor: u64 = 0;
        let mut keys: Vec<String> = Vec::new();
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        // SCAN may report a key more than once and gives no ordering.
        keys.sort();
        keys.dedup();
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<Option<Vec<u8>>> = cmd("MGET").arg(&keys).query_async(&mut conn).await?;
        Ok(keys
            .into_iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|value| Entry { key, value }))
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        debug!("DEL {key}");
        let mut conn = self.conn.clone();
        let _: i64 = cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }

    async fn guarded_put(&self, put: &GuardedPut) -> Result<TxnOutcome, StoreError> {
        debug!("TXN if exists({:?}) then SET {}", put.guard_key, put.key);
        let payload = serde_json::to_string(put).map_err(|source| StoreError::Serialization {
            key: put.key.clone(),
            source,
        })?;

        let mut conn = self.conn.clone();
        let mut invocation = GUARDED_PUT_SCRIPT.prepare_invoke();
        invocation.arg(payload);
        let raw: String = invocation.invoke_async(&mut conn).await?;
        parse_txn_response(&raw)
    }
}

/// Decodes the JSON reply of the guarded put script.
pub(crate) fn parse_txn_response(raw: &str) -> Result<TxnOutcome, StoreError> {
    let value: Value = serde_json::from_str(raw).map_err(|err| StoreError::Other {
        message: Cow::Owned(format!("failed to parse lua response: {err}")),
    })?;

    let Some(error) = value.get("error") else {
        return Ok(TxnOutcome::Committed);
    };

    let text_field = |name: &str| {
        value
            .get(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_default()
    };

    match error.as_str() {
        Some("precondition_failed") => Ok(TxnOutcome::GuardMissing {
            guard_key: text_field("guard_key"),
        }),
        Some("already_exists") => Ok(TxnOutcome::KeyExists { key: text_field("key") }),
        Some(other) => Err(StoreError::Other {
            message: Cow::Owned(other.to_string()),
        }),
        None => Err(StoreError::Other {
            message: Cow::Borrowed("lua_error"),
        }),
    }
}

/// Escapes Redis glob metacharacters so a literal prefix can be used with MATCH.
pub(crate) fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for ch in literal.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\' | '^') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
