// [libs/infra/boundary-providers/src/cache.rs]
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::errors::ProviderError;

/// Content-addressed local cache (§4.4's "local cache is content-
/// addressed" guarantee). Files are keyed by the SHA-256 of their own
/// bytes, so a cache hit is also a free integrity check: if the bytes
/// on disk don't hash to the filename, the entry is treated as corrupt
/// and re-fetched rather than trusted.
pub struct ContentCache {
    dir: PathBuf,
}

impl ContentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn content_hash(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    fn path_for(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{hash}.blob"))
    }

    pub async fn get(&self, hash: &str) -> Option<Vec<u8>> {
        let path = self.path_for(hash);
        let bytes = tokio::fs::read(&path).await.ok()?;
        if Self::content_hash(&bytes) == hash {
            Some(bytes)
        } else {
            None
        }
    }

    pub async fn put(&self, bytes: &[u8]) -> Result<String, ProviderError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ProviderError::Schema(format!("creating cache dir: {e}")))?;
        let hash = Self::content_hash(bytes);
        let path = self.path_for(&hash);
        let tmp_path = self.dir.join(format!("{hash}.blob.tmp"));
        tokio::fs::write(&tmp_path, bytes)
            .await
            .map_err(|e| ProviderError::Schema(format!("writing cache entry: {e}")))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| ProviderError::Schema(format!("renaming cache entry: {e}")))?;
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips_and_verifies_hash() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        let hash = cache.put(b"hello world").await.unwrap();
        let got = cache.get(&hash).await.unwrap();
        assert_eq!(got, b"hello world");
    }

    #[tokio::test]
    async fn get_on_unknown_hash_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        assert!(cache.get("does-not-exist").await.is_none());
    }
}
