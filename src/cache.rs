//! Responses kept on disk for a while.
//!
//! Each entry is one JSON file named after the SHA-256 of its key, so that
//! identical parameter sets sent to the same site share an entry.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::req::Request;
use crate::Result;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    key: String,
    #[serde(with = "crate::util::dt")]
    cached_at: DateTime<Utc>,
    data: Value,
}

/// A [`Request`] answered from the cache while its entry is younger than
/// the expiry.
#[derive(Debug, Clone)]
pub struct CachedRequest {
    expiry: chrono::Duration,
    request: Request,
}

impl CachedRequest {
    pub fn new(expiry: chrono::Duration, request: Request) -> Self {
        Self { expiry, request }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Site, user and the parameters sorted by name.
    pub fn cache_key(&self) -> String {
        let site = self.request.site();
        let mut params = self.request.encoded_items();
        params.sort();
        let params = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!(
            "{}|{}|{params}",
            site.id(),
            site.user.as_deref().unwrap_or_default()
        )
    }

    pub fn cache_path(&self) -> PathBuf {
        let digest = Sha256::digest(self.cache_key().as_bytes());
        let name: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        self.request
            .site()
            .settings
            .cache_dir
            .join(format!("{name}.json"))
    }

    async fn load(&self, path: &Path, key: &str) -> Option<Value> {
        let bytes = tokio::fs::read(path).await.ok()?;
        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(e) => e,
            Err(e) => {
                debug!("ignoring unreadable cache entry {}: {e}", path.display());
                return None;
            }
        };
        if entry.key != key {
            debug!("cache entry {} belongs to another key", path.display());
            return None;
        }
        if Utc::now() - entry.cached_at >= self.expiry {
            debug!("cache entry {} expired", path.display());
            return None;
        }
        Some(entry.data)
    }

    async fn store(&self, path: &Path, key: String, data: &Value) -> Result<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let entry = CacheEntry {
            key,
            cached_at: Utc::now(),
            data: data.clone(),
        };
        tokio::fs::write(path, serde_json::to_vec(&entry)?).await?;
        Ok(())
    }

    pub async fn submit(self) -> Result<Value> {
        let key = self.cache_key();
        let path = self.cache_path();
        if let Some(data) = self.load(&path, &key).await {
            debug!(key = %key, "cache hit");
            return Ok(data);
        }
        debug!(key = %key, "cache miss");
        let data = self.request.clone().submit().await?;
        if let Err(e) = self.store(&path, key, &data).await {
            warn!("failed to write cache entry {}: {e}", path.display());
        }
        Ok(data)
    }
}
