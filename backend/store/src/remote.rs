//! # Redis
//!
//! Network backend selected with `redis://` (or `rediss://`).
//!
//! ## Layout
//!
//! - One Redis hash per collection: `{namespace}:{collection}`
//! - Hash field is a sequence number, value is the JSON document
//! - Sequence numbers come from an atomic `INCR` on `{namespace}:{collection}:seq`,
//!   so insertion order survives `HGETALL` returning fields unordered
//!
//! Filtering happens client side after `HGETALL`. Fine for a recipe book, not for
//! collections with millions of documents.
//!
//! ## Updates
//!
//! Updates are compare-and-set: the new document is written only if the field still
//! holds the exact JSON that was read. The check and the write run in one Lua script,
//! so a document deleted or rewritten in between is left alone.
use std::{collections::HashMap, sync::Arc, time::Duration};

use redis::{
    AsyncCommands, Client, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::{error::StoreError, filter::Filter};

#[derive(Clone)]
pub struct RemoteStore {
    client: Client,
    connection: Arc<OnceCell<ConnectionManager>>,
    swap_script: Arc<Script>,
}

// ARGV holds (field, expected, replacement) triples.
const SWAP_SCRIPT: &str = r#"
local swapped = 0
for i = 1, #ARGV, 3 do
    if redis.call('HGET', KEYS[1], ARGV[i]) == ARGV[i + 1] then
        redis.call('HSET', KEYS[1], ARGV[i], ARGV[i + 2])
        swapped = swapped + 1
    end
end
return swapped
"#;

struct Stored {
    seq: u64,
    encoded: String,
    document: Value,
}

impl RemoteStore {
    /// Parses the URL only. The connection is opened on first use, so a store that is
    /// down at boot surfaces as request errors instead of a crash.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::open(url)?,
            connection: Arc::new(OnceCell::new()),
            swap_script: Arc::new(Script::new(SWAP_SCRIPT)),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let connection = self
            .connection
            .get_or_try_init(|| async {
                let config = ConnectionManagerConfig::new()
                    .set_number_of_retries(1)
                    .set_connection_timeout(Duration::from_millis(500));

                let manager = self
                    .client
                    .get_connection_manager_with_config(config)
                    .await?;
                info!("Connected to Redis");

                Ok::<_, StoreError>(manager)
            })
            .await?;

        Ok(connection.clone())
    }

    pub async fn insert(&self, key: &str, document: Value) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let encoded = serde_json::to_string(&document)?;

        let seq: u64 = conn.incr(sequence_key(key), 1).await?;
        let _: () = conn.hset(key, seq, encoded).await?;

        Ok(())
    }

    pub async fn retrieve(&self, key: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .matching(key, filter)
            .await?
            .into_iter()
            .map(|stored| stored.document)
            .collect())
    }

    pub async fn update(
        &self,
        key: &str,
        filter: &Filter,
        field: &str,
        value: &Value,
    ) -> Result<usize, StoreError> {
        let mut swaps = Vec::new();
        for mut stored in self.matching(key, filter).await? {
            if let Some(object) = stored.document.as_object_mut() {
                object.insert(field.to_string(), value.clone());
                let replacement = serde_json::to_string(&stored.document)?;
                swaps.push((stored.seq, stored.encoded, replacement));
            }
        }

        self.swap(key, swaps).await
    }

    async fn swap(
        &self,
        key: &str,
        swaps: Vec<(u64, String, String)>,
    ) -> Result<usize, StoreError> {
        if swaps.is_empty() {
            return Ok(0);
        }

        let mut invocation = self.swap_script.prepare_invoke();
        invocation.key(key);
        for (seq, expected, replacement) in swaps {
            invocation.arg(seq).arg(expected).arg(replacement);
        }

        let mut conn = self.connection().await?;
        let swapped: usize = invocation.invoke_async(&mut conn).await?;

        Ok(swapped)
    }

    pub async fn delete(&self, key: &str, filter: &Filter) -> Result<usize, StoreError> {
        let seqs: Vec<u64> = self
            .matching(key, filter)
            .await?
            .into_iter()
            .map(|stored| stored.seq)
            .collect();
        if seqs.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection().await?;
        let deleted: usize = conn.hdel(key, seqs).await?;

        Ok(deleted)
    }

    pub async fn count(&self, key: &str) -> Result<usize, StoreError> {
        let mut conn = self.connection().await?;
        let count: usize = conn.hlen(key).await?;

        Ok(count)
    }

    async fn matching(&self, key: &str, filter: &Filter) -> Result<Vec<Stored>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: HashMap<String, String> = conn.hgetall(key).await?;

        let mut documents = Vec::with_capacity(raw.len());
        for (field, encoded) in raw {
            let Ok(seq) = field.parse::<u64>() else {
                warn!("Skipping foreign field {field} in {key}");
                continue;
            };

            let document: Value = match serde_json::from_str(&encoded) {
                Ok(document) => document,
                Err(e) => {
                    warn!("Skipping malformed document {seq} in {key}: {e}");
                    continue;
                }
            };

            if filter.matches(&document) {
                documents.push(Stored {
                    seq,
                    encoded,
                    document,
                });
            }
        }

        documents.sort_by_key(|stored| stored.seq);

        Ok(documents)
    }
}

fn sequence_key(key: &str) -> String {
    format!("{key}:seq")
}
