//! Disk-backed storage for HTTP responses.
//!
//! One JSON file per cache key, named by the SHA-256 of the canonical key.
//! Entries carry their own expiry; an expired or unreadable entry is treated
//! as absent and overwritten by the next store, never served.
//!
//! Processes sharing one cache directory may race on writing the same key.
//! Which write wins is undefined; no cross-process locking is attempted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One persisted response. Only 200 responses to GET requests are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url: String,
    pub status: u16,
    pub body: String,
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Directives we care about from a `Cache-Control` response header.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CacheControl {
    no_store: bool,
    max_age: Option<i64>,
}

fn parse_cache_control(header: &str) -> CacheControl {
    let mut parsed = CacheControl::default();
    for directive in header.split(',') {
        let directive = directive.trim().to_ascii_lowercase();
        if directive == "no-store" || directive == "no-cache" {
            parsed.no_store = true;
        } else if let Some(seconds) = directive.strip_prefix("max-age=") {
            parsed.max_age = seconds.trim().parse().ok();
        }
    }
    parsed
}

pub struct HttpCache {
    dir: PathBuf,
    retention: Duration,
    respect_cache_control: bool,
}

impl HttpCache {
    #[must_use]
    pub fn new(dir: PathBuf, retention: Duration, respect_cache_control: bool) -> Self {
        Self {
            dir,
            retention,
            respect_cache_control,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        use std::fmt::Write;

        let digest = Sha256::digest(key.as_bytes());
        let mut name = String::with_capacity(64 + 5);
        for byte in digest {
            let _ = write!(name, "{byte:02x}");
        }
        name.push_str(".json");
        self.dir.join(name)
    }

    /// Returns the entry for `key` if one exists and is still fresh.
    ///
    /// Expired or unreadable entries count as absent.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        let content = std::fs::read_to_string(&path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Discarding unreadable cache entry {}: {err}", path.display());
                return None;
            }
        };

        if entry.is_fresh(Utc::now()) {
            debug!("Cache hit for {}", entry.url);
            Some(entry)
        } else {
            debug!("Cache entry expired for {}", entry.url);
            None
        }
    }

    /// Persists a response if it is eligible, superseding any previous entry
    /// under the same key. Returns whether the response was stored.
    ///
    /// Eligibility: status 200, and no `no-store`/`no-cache` directive when
    /// cache-control is honored. `max-age` overrides the retention window.
    pub fn store(
        &self,
        key: &str,
        url: &str,
        status: u16,
        cache_control: Option<&str>,
        body: &str,
    ) -> Result<bool, CacheError> {
        if status != 200 {
            return Ok(false);
        }

        let mut expiry = self.retention;
        if self.respect_cache_control
            && let Some(header) = cache_control
        {
            let directives = parse_cache_control(header);
            if directives.no_store {
                debug!("Not caching {url}: {header}");
                return Ok(false);
            }
            if let Some(seconds) = directives.max_age {
                expiry = Duration::seconds(seconds);
            }
        }

        let now = Utc::now();
        let entry = CacheEntry {
            url: url.to_string(),
            status,
            body: body.to_string(),
            stored_at: now,
            expires_at: now + expiry,
        };

        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.entry_path(key), serde_json::to_string(&entry)?)?;
        debug!("Cached response for {url}");

        Ok(true)
    }
}
