//! Session-scoped key/value scratchpad.
//!
//! One [`MemoryStore`] is created per top-level agent session (sub-agents
//! get their own). The store backs two things: the `memory` tool the
//! model can call, and `${memory.KEY}` placeholder resolution. There is
//! deliberately no process-wide fallback instance — stores are always
//! injected explicitly, so nothing leaks between unrelated sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A stored value with its write timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub value: String,
    pub timestamp: DateTime<Utc>,
}

/// A search hit: key, value, and when the value was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryHit {
    pub key: String,
    pub value: String,
    pub timestamp: DateTime<Utc>,
}

/// The key/value scratchpad.
///
/// Cheap to clone (shared interior); the session that owns it is the only
/// writer in practice, but the `RwLock` keeps the memory tool safe when
/// a delegated task overlaps with independent I/O.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under a key, overwriting any previous value.
    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.into(),
            MemoryEntry {
                value: value.into(),
                timestamp: Utc::now(),
            },
        );
    }

    /// Get the current value of a key.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).map(|e| e.value.clone())
    }

    /// Delete a key. Returns whether it existed.
    pub async fn delete(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Case-insensitive substring search over keys and values.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<MemoryHit> {
        let query_lower = query.to_lowercase();
        let entries = self.entries.read().await;

        let mut hits: Vec<MemoryHit> = entries
            .iter()
            .filter(|(k, e)| {
                k.to_lowercase().contains(&query_lower)
                    || e.value.to_lowercase().contains(&query_lower)
            })
            .map(|(k, e)| MemoryHit {
                key: k.clone(),
                value: e.value.clone(),
                timestamp: e.timestamp,
            })
            .collect();

        // Newest first, stable across runs
        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.key.cmp(&b.key)));
        hits.truncate(limit);
        hits
    }

    /// List up to `limit` stored keys, sorted.
    pub async fn list_keys(&self, limit: usize) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        keys.truncate(limit);
        keys
    }

    /// Remove every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
