// ファイルシステムキャッシュ: キー → WebPバイト列 + features
//
// 配置: `<cache_dir>/<key>/image.webp` と `metadata.json`

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::bridge::Features;
use crate::error::BridgeError;

/// Files every complete cache entry holds.
const CACHE_FILES: &[&str] = &["image.webp", "metadata.json"];

/// Suffix counter for temporary entry directories within this process.
static TMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A cached encode result.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEncode {
    pub webp: Vec<u8>,
    pub features: Features,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct CacheMetadata {
    cache_key: String,
    #[serde(flatten)]
    features: Features,
}

/// Keys must be exactly 64 lowercase hex characters, which also keeps them
/// from escaping the cache directory.
fn validate_cache_key(key: &str) -> crate::error::Result<()> {
    if key.len() == 64 && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        Ok(())
    } else {
        Err(BridgeError::cache(format!(
            "invalid cache key: expected 64-character lowercase hex string, got '{}'",
            key
        )))
    }
}

pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    fn key_dir(&self, key: &str) -> crate::error::Result<PathBuf> {
        validate_cache_key(key)?;
        Ok(self.cache_dir.join(key))
    }

    /// Store an entry. Files go to a temporary directory unique to this call,
    /// which is then renamed into place, so readers never see a partial entry.
    ///
    /// A key always names the same input and settings, so when another writer
    /// has already published a complete entry, that entry is kept and this
    /// call succeeds without replacing it.
    pub fn store(&self, key: &str, entry: &CachedEncode) -> crate::error::Result<()> {
        let dir = self.key_dir(key)?;
        fs::create_dir_all(&self.cache_dir).map_err(|e| BridgeError::cache(e.to_string()))?;

        let tmp_dir = self.cache_dir.join(format!(
            "{key}.tmp-{}-{}",
            std::process::id(),
            TMP_SEQUENCE.fetch_add(1, Ordering::Relaxed)
        ));

        let result =
            write_entry(&tmp_dir, key, entry).and_then(|()| self.publish(&tmp_dir, &dir, key));
        // Already gone when the rename succeeded.
        let _ = fs::remove_dir_all(&tmp_dir);
        result
    }

    fn publish(&self, tmp_dir: &Path, dir: &Path, key: &str) -> crate::error::Result<()> {
        if self.contains(key) {
            debug!(key = %key, "cache entry already present, keeping it");
            return Ok(());
        }
        // Leftover of an interrupted writer.
        if dir.exists() {
            let _ = fs::remove_dir_all(dir);
        }

        match fs::rename(tmp_dir, dir) {
            Ok(()) => Ok(()),
            Err(e) if self.contains(key) => {
                debug!(key = %key, error = %e, "cache entry published concurrently, keeping it");
                Ok(())
            }
            Err(e) => Err(BridgeError::cache(e.to_string())),
        }
    }

    /// Fetch an entry; `None` on a cache miss.
    pub fn retrieve(&self, key: &str) -> crate::error::Result<Option<CachedEncode>> {
        if !self.contains(key) {
            return Ok(None);
        }
        let dir = self.key_dir(key)?;

        let metadata_str = fs::read_to_string(dir.join("metadata.json"))
            .map_err(|e| BridgeError::cache(e.to_string()))?;
        let metadata: CacheMetadata = serde_json::from_str(&metadata_str)?;

        if metadata.cache_key != key {
            return Err(BridgeError::cache(format!(
                "cache key mismatch: expected '{}', found '{}'",
                key, metadata.cache_key
            )));
        }

        let webp =
            fs::read(dir.join("image.webp")).map_err(|e| BridgeError::cache(e.to_string()))?;

        Ok(Some(CachedEncode {
            webp,
            features: metadata.features,
        }))
    }

    pub fn contains(&self, key: &str) -> bool {
        match self.key_dir(key) {
            Ok(dir) => CACHE_FILES.iter().all(|f| dir.join(f).exists()),
            Err(_) => false,
        }
    }
}

fn write_entry(tmp_dir: &Path, key: &str, entry: &CachedEncode) -> crate::error::Result<()> {
    fs::create_dir(tmp_dir).map_err(|e| BridgeError::cache(e.to_string()))?;
    fs::write(tmp_dir.join("image.webp"), &entry.webp)
        .map_err(|e| BridgeError::cache(e.to_string()))?;

    let metadata = CacheMetadata {
        cache_key: key.to_string(),
        features: entry.features,
    };
    let metadata_json = serde_json::to_string(&metadata)?;
    fs::write(tmp_dir.join("metadata.json"), metadata_json.as_bytes())
        .map_err(|e| BridgeError::cache(e.to_string()))
}
