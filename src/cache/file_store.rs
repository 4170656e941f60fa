//! On-disk persistence for cached momentum results.
//!
//! One JSON file per cache key, named after a digest of the entity and the
//! window length. Files carry their own wall-clock creation time and TTL so
//! they stay meaningful across restarts.

use super::CacheKey;
use crate::momentum::{MomentumError, MomentumResult};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const DIGEST_HEX_LEN: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub entity: String,
    pub window_days: usize,
    pub created_at: DateTime<Utc>,
    pub ttl_secs: u64,
    pub payload: MomentumResult,
}

impl StoredEntry {
    /// Time left before this entry goes stale, if any.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let age = now.signed_duration_since(self.created_at).to_std().ok()?;
        Duration::from_secs(self.ttl_secs)
            .checked_sub(age)
            .filter(|d| !d.is_zero())
    }
}

pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory {:?}", dir))?;
        Ok(Self { dir })
    }

    /// Loads the stored entry for `key`. A missing file is `Ok(None)`; a file
    /// that doesn't parse, or belongs to another key, is `CacheCorruption`.
    pub async fn load(&self, key: &CacheKey) -> Result<Option<StoredEntry>, MomentumError> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                warn!("Failed to read cache file {:?}: {}", path, e);
                return Ok(None);
            }
        };

        let stored: StoredEntry = serde_json::from_slice(&bytes).map_err(|e| {
            MomentumError::CacheCorruption(format!("{}: {}", path.display(), e))
        })?;
        if stored.entity != key.entity() || stored.window_days != key.window_days() {
            return Err(MomentumError::CacheCorruption(format!(
                "{}: holds '{}'/{} instead of {}",
                path.display(),
                stored.entity,
                stored.window_days,
                key
            )));
        }
        Ok(Some(stored))
    }

    /// Writes the entry to a temporary file and renames it into place, so a
    /// reader never sees a partially written payload.
    pub async fn save(&self, key: &CacheKey, payload: &MomentumResult, ttl: Duration) -> Result<()> {
        let stored = StoredEntry {
            entity: key.entity().to_string(),
            window_days: key.window_days(),
            created_at: Utc::now(),
            ttl_secs: ttl.as_secs(),
            payload: payload.clone(),
        };
        let json = serde_json::to_vec(&stored).context("Failed to serialize cache entry")?;

        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json)
            .await
            .with_context(|| format!("Failed to write {:?}", tmp_path))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("Failed to move {:?} into place", tmp_path))?;
        debug!("Persisted cache entry {} to {:?}", key, path);
        Ok(())
    }

    pub async fn remove(&self, key: &CacheKey) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove cache file"),
        }
    }

    /// Removes the files of every window of `entity`. Returns how many went.
    pub async fn remove_entity(&self, entity: &str) -> Result<usize> {
        let prefix = format!("{}_", entity_digest(entity));
        let mut removed = 0;
        let mut dir = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("Failed to list {:?}", self.dir))?;
        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name();
            if name.to_string_lossy().starts_with(&prefix) {
                match tokio::fs::remove_file(item.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e).context("Failed to remove cache file"),
                }
            }
        }
        Ok(removed)
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.json",
            entity_digest(key.entity()),
            key.window_days()
        ))
    }
}

fn entity_digest(entity: &str) -> String {
    let digest = Sha256::digest(entity.as_bytes());
    let mut hex = String::with_capacity(DIGEST_HEX_LEN);
    for byte in digest.iter().take(DIGEST_HEX_LEN / 2) {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_provider::NullCatalogProvider;
    use crate::momentum::{CompositeScorer, MomentumPipeline, Synthesizer};
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample_result(name: &str) -> MomentumResult {
        MomentumPipeline::new(
            Arc::new(NullCatalogProvider),
            Synthesizer::new(1),
            CompositeScorer::default(),
        )
        .synthetic_at(name, 7, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCacheStore::new(temp_dir.path()).unwrap();
        let key = CacheKey::new("Neon Wave", 7);
        let result = sample_result("Neon Wave");

        assert!(store.load(&key).await.unwrap().is_none());
        store
            .save(&key, &result, Duration::from_secs(60))
            .await
            .unwrap();

        let stored = store.load(&key).await.unwrap().unwrap();
        assert_eq!(stored.payload, result);
        assert_eq!(stored.entity, "neon wave");
        assert!(stored.remaining(Utc::now()).is_some());

        // Other windows are separate files.
        assert!(store.load(&CacheKey::new("Neon Wave", 14)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_garbage_file_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCacheStore::new(temp_dir.path()).unwrap();
        let key = CacheKey::new("Neon Wave", 7);
        std::fs::write(store.path_for(&key), b"{\"entity\": 12").unwrap();

        assert!(matches!(
            store.load(&key).await,
            Err(MomentumError::CacheCorruption(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_entity_removes_all_windows() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCacheStore::new(temp_dir.path()).unwrap();
        let result = sample_result("Neon Wave");
        for window in [7, 14] {
            store
                .save(&CacheKey::new("Neon Wave", window), &result, Duration::from_secs(60))
                .await
                .unwrap();
        }
        let other = CacheKey::new("Other Artist", 7);
        store.save(&other, &result, Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.remove_entity("neon wave").await.unwrap(), 2);
        assert!(store.load(&CacheKey::new("Neon Wave", 7)).await.unwrap().is_none());
        assert!(store.load(&other).await.unwrap().is_some());

        store.remove(&other).await.unwrap();
        store.remove(&other).await.unwrap();
        assert!(store.load(&other).await.unwrap().is_none());
    }

    #[test]
    fn test_remaining() {
        let now = Utc::now();
        let entry = StoredEntry {
            entity: "x".into(),
            window_days: 7,
            created_at: now - ChronoDuration::seconds(30),
            ttl_secs: 60,
            payload: sample_result("x"),
        };
        let remaining = entry.remaining(now).unwrap();
        assert!(remaining <= Duration::from_secs(30));
        assert!(entry.remaining(now + ChronoDuration::seconds(31)).is_none());
    }
}
