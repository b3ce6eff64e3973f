use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use super::{ApiError, Transport};

/// Character substituted for everything outside `[A-Za-z0-9]` in cache keys.
const KEY_FILLER: char = '_';
const CACHE_FILE_SUFFIX: &str = ".json";

/// Wraps a `Transport` with optional on-disk memoization keyed by request path.
///
/// Entries are written through on the first miss and never invalidated, so a
/// populated cache directory replays a previous run without touching the network.
pub struct FetchCache<T> {
    transport: T,
    cache_dir: Option<PathBuf>,
}

impl<T: Transport> FetchCache<T> {
    pub fn new(transport: T, cache_dir: Option<PathBuf>) -> Self {
        Self {
            transport,
            cache_dir,
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    /// Verify the configured cache directory exists and is a directory.
    /// A no-op when caching is not configured.
    pub async fn check_cache_dir(&self) -> Result<(), ApiError> {
        match &self.cache_dir {
            Some(dir) => ensure_directory(dir).await,
            None => Ok(()),
        }
    }

    /// Fetch `path`, consulting the cache first when `use_cache` is set and a
    /// cache directory is configured.
    #[instrument(skip(self))]
    pub async fn get(&self, path: &str, use_cache: bool) -> Result<Value, ApiError> {
        let dir = match (&self.cache_dir, use_cache) {
            (Some(dir), true) => dir,
            _ => return self.transport.get_json(path).await,
        };

        ensure_directory(dir).await?;
        let file = dir.join(cache_file_name(path));

        if let Some(cached) = read_cached(&file).await? {
            debug!(file = %file.display(), "cache hit");
            return Ok(cached);
        }

        debug!(file = %file.display(), "cache miss");
        let value = self.transport.get_json(path).await?;
        write_cached(&file, &value).await?;
        Ok(value)
    }
}

/// Derive the cache file name for a request path.
pub fn cache_file_name(path: &str) -> String {
    let mut name: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { KEY_FILLER })
        .collect();
    name.push_str(CACHE_FILE_SUFFIX);
    name
}

async fn ensure_directory(dir: &Path) -> Result<(), ApiError> {
    let metadata = tokio::fs::metadata(dir)
        .await
        .map_err(|source| ApiError::CacheDir {
            path: dir.to_path_buf(),
            source,
        })?;

    if metadata.is_dir() {
        Ok(())
    } else {
        Err(ApiError::CacheNotADirectory {
            path: dir.to_path_buf(),
        })
    }
}

/// `Ok(None)` when the file does not exist; every other failure is an error.
async fn read_cached(file: &Path) -> Result<Option<Value>, ApiError> {
    let bytes = match tokio::fs::read(file).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ApiError::CacheRead {
                path: file.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| ApiError::CacheDecode {
            path: file.to_path_buf(),
            source,
        })
}

async fn write_cached(file: &Path, value: &Value) -> Result<(), ApiError> {
    let bytes = serde_json::to_vec(value).map_err(|source| ApiError::CacheEncode {
        path: file.to_path_buf(),
        source,
    })?;

    tokio::fs::write(file, bytes)
        .await
        .map_err(|source| ApiError::CacheWrite {
            path: file.to_path_buf(),
            source,
        })
}
