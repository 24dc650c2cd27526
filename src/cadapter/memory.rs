//! In-memory object backend for tests and local development.

use super::client::ObjectBackend;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Simple in-memory backend. Counts the calls that actually reach it so
/// tests can assert on dedup and cache behavior.
#[derive(Default)]
pub struct InMemoryBackend {
    map: RwLock<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    gets: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put_object` calls that reached this backend.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::Relaxed)
    }

    /// Number of `get_object` calls that reached this backend.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::Relaxed)
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.map.read().await.contains_key(key)
    }
}

#[async_trait]
impl ObjectBackend for InMemoryBackend {
    async fn put_object(&self, key: &str, data: &[u8]) -> anyhow::Result<()> {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.map.write().await.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        Ok(self.map.read().await.get(key).cloned())
    }

    async fn is_exist(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.map.read().await.contains_key(key))
    }
}
