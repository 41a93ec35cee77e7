//! Blob storage seam: `put(path, bytes)` / `get(path)`.
//!
//! Paths are namespaced per user and per message (for example
//! `chat/media/user/{user_id}/{uuid}.png`). The backing store is an external
//! capability; the in-memory implementation backs tests and single-node
//! deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, path: &str, bytes: Vec<u8>) -> AppResult<()>;
    async fn get(&self, path: &str) -> AppResult<Vec<u8>>;
}

#[derive(Default)]
pub struct MemoryBlobStore {
    inner: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, bytes: Vec<u8>) -> AppResult<()> {
        self.inner.write().await.insert(path.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, path: &str) -> AppResult<Vec<u8>> {
        self.inner
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Image not found!".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trip() {
        let blobs = MemoryBlobStore::new();
        blobs.put("user/1/profile.png", vec![1, 2, 3]).await.unwrap();
        assert_eq!(blobs.get("user/1/profile.png").await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let blobs = MemoryBlobStore::new();
        assert!(matches!(
            blobs.get("user/unknown/profile.png").await,
            Err(AppError::NotFound(_))
        ));
    }
}
