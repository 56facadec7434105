//! In-process storage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cookie::CookieJar;
use tokio::sync::RwLock;

use super::SessionStorage;
use crate::error::Result;
use crate::record::SessionRecord;

/// Keeps records in a map. Contents are lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemoryStorage {
    /// Create an empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Drop every record whose deadlines have passed at `now`.
    pub async fn purge_expired(&self, now: i64) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        before - records.len()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn load(&self, key: &str, _jar: &CookieJar) -> Result<Option<SessionRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, record: &SessionRecord, _jar: &mut CookieJar) -> Result<()> {
        self.records
            .write()
            .await
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn destroy(&self, key: &str, _jar: &mut CookieJar) -> Result<()> {
        self.records.write().await.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
