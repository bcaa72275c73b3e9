//! HTTP fetching with caching.
//!
//! Fetches rendered viewer pages and caches the raw HTML locally so a page
//! can be re-analyzed without hitting the site again. Also hosts the viewer
//! URL helpers: validation, the normalized duplicate-detection key, and
//! bulk-input splitting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};
use url::Url;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: Url,
    /// Path where the raw HTML is cached.
    pub cache_path: PathBuf,
    pub fetched_at: DateTime<Utc>,
    /// Whether this was served from cache.
    pub from_cache: bool,
}

/// Metadata stored alongside cached content.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheMetadata {
    url: String,
    fetched_at: DateTime<Utc>,
    content_length: usize,
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Directory to cache raw pages
    pub cache_dir: PathBuf,

    /// How long cached content is considered fresh
    pub cache_ttl: Duration,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./data/raw"),
            cache_ttl: Duration::from_secs(3600),
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// HTTP fetcher with local caching.
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("raidmeter/0.1.0")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a fetcher with default configuration.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(FetcherConfig::default())
    }

    /// Fetch a URL, using cache if available and fresh.
    pub async fn fetch(&self, url: &Url) -> Result<FetchResult, FetchError> {
        let cache_path = self.cache_path_for_url(url);
        let meta_path = self.meta_path_for_url(url);

        if let Some(result) = self.check_cache(url, &cache_path, &meta_path).await? {
            return Ok(result);
        }

        self.fetch_and_cache(url, &cache_path, &meta_path).await
    }

    /// Force fetch from network, ignoring cache.
    pub async fn fetch_fresh(&self, url: &Url) -> Result<FetchResult, FetchError> {
        let cache_path = self.cache_path_for_url(url);
        let meta_path = self.meta_path_for_url(url);
        self.fetch_and_cache(url, &cache_path, &meta_path).await
    }

    /// Check if content is cached and fresh.
    async fn check_cache(
        &self,
        url: &Url,
        cache_path: &Path,
        meta_path: &Path,
    ) -> Result<Option<FetchResult>, FetchError> {
        if !cache_path.exists() || !meta_path.exists() {
            return Ok(None);
        }

        let meta_content = fs::read_to_string(meta_path).await?;
        let meta: CacheMetadata = match serde_json::from_str(&meta_content) {
            Ok(m) => m,
            Err(_) => return Ok(None),
        };

        let age = Utc::now().signed_duration_since(meta.fetched_at);
        if age.num_seconds() > self.config.cache_ttl.as_secs() as i64 {
            debug!("Cache expired for {}", url);
            return Ok(None);
        }

        info!("Serving {} from cache", url);
        Ok(Some(FetchResult {
            url: url.clone(),
            cache_path: cache_path.to_path_buf(),
            fetched_at: meta.fetched_at,
            from_cache: true,
        }))
    }

    /// Fetch from network and cache the result.
    async fn fetch_and_cache(
        &self,
        url: &Url,
        cache_path: &Path,
        meta_path: &Path,
    ) -> Result<FetchResult, FetchError> {
        info!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let content = response.bytes().await?;

        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(cache_path, &content).await?;

        let fetched_at = Utc::now();
        let meta = CacheMetadata {
            url: url.to_string(),
            fetched_at,
            content_length: content.len(),
        };
        fs::write(meta_path, serde_json::to_string_pretty(&meta)?).await?;

        Ok(FetchResult {
            url: url.clone(),
            cache_path: cache_path.to_path_buf(),
            fetched_at,
            from_cache: false,
        })
    }

    /// Generate a cache path for a URL.
    fn cache_path_for_url(&self, url: &Url) -> PathBuf {
        let hash = Self::url_hash(url);
        let host = url.host_str().unwrap_or("unknown");
        self.config
            .cache_dir
            .join(host)
            .join(format!("{}.html", hash))
    }

    /// Generate a metadata path for a URL.
    fn meta_path_for_url(&self, url: &Url) -> PathBuf {
        let hash = Self::url_hash(url);
        let host = url.host_str().unwrap_or("unknown");
        self.config
            .cache_dir
            .join(host)
            .join(format!("{}.meta.json", hash))
    }

    /// Hash a URL to a short string.
    fn url_hash(url: &Url) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_str().as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..8])
    }

    /// Read cached content as string.
    pub async fn read_cached_text(&self, result: &FetchResult) -> Result<String, FetchError> {
        Ok(fs::read_to_string(&result.cache_path).await?)
    }
}

// ── Viewer URL helpers ──────────────────────────────────────────────────────

/// Whether a string is a valid viewer URL
/// (`https://turtlogs.com/viewer/<id>/base`).
pub fn is_valid_viewer_url(raw: &str) -> bool {
    let url = match Url::parse(raw) {
        Ok(u) => u,
        Err(_) => return false,
    };
    let host_ok = matches!(url.host_str(), Some("turtlogs.com") | Some("www.turtlogs.com"));
    let re = Regex::new(r"(?i)^/viewer/\d+/base").unwrap();
    host_ok && re.is_match(url.path())
}

/// Lowercased origin + path; query and fragment are ignored so the key stays
/// stable for duplicate detection.
pub fn normalize_viewer_url(raw: &str) -> Result<String, FetchError> {
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    let origin = url.origin().ascii_serialization();
    Ok(format!("{}{}", origin, url.path()).to_lowercase())
}

/// Split bulk user input into candidate URLs
/// (newlines, commas, semicolons or whitespace).
pub fn split_bulk_urls(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == '\n' || c == '\r' || c == ',' || c == ';' || c.is_whitespace())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> FetcherConfig {
        FetcherConfig {
            cache_dir: temp_dir.path().to_path_buf(),
            cache_ttl: Duration::from_secs(3600),
            timeout: Duration::from_secs(10),
            user_agent: "test-agent".to_string(),
        }
    }

    #[test]
    fn test_url_hash_distinct() {
        let url1 = Url::parse("https://turtlogs.com/viewer/1/base").unwrap();
        let url2 = Url::parse("https://turtlogs.com/viewer/2/base").unwrap();

        let hash1 = Fetcher::url_hash(&url1);
        let hash2 = Fetcher::url_hash(&url2);

        assert_ne!(hash1, hash2);
        assert_eq!(hash1.len(), 16); // 8 bytes = 16 hex chars
    }

    #[test]
    fn test_cache_path_generation() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Fetcher::new(test_config(&temp_dir)).unwrap();

        let url = Url::parse("https://turtlogs.com/viewer/123/base").unwrap();
        let cache_path = fetcher.cache_path_for_url(&url);

        assert!(cache_path.starts_with(temp_dir.path()));
        assert!(cache_path.to_string_lossy().contains("turtlogs.com"));
        assert!(cache_path.to_string_lossy().ends_with(".html"));
    }

    #[tokio::test]
    async fn test_cache_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Fetcher::new(test_config(&temp_dir)).unwrap();
        let url = Url::parse("https://turtlogs.com/viewer/9/base").unwrap();

        let cache_path = fetcher.cache_path_for_url(&url);
        let meta_path = fetcher.meta_path_for_url(&url);

        // Seed cache by hand and confirm the fetcher serves it
        fs::create_dir_all(cache_path.parent().unwrap())
            .await
            .unwrap();
        fs::write(&cache_path, "<html>cached</html>").await.unwrap();
        let meta = CacheMetadata {
            url: url.to_string(),
            fetched_at: Utc::now(),
            content_length: 19,
        };
        fs::write(&meta_path, serde_json::to_string(&meta).unwrap())
            .await
            .unwrap();

        let result = fetcher
            .check_cache(&url, &cache_path, &meta_path)
            .await
            .unwrap()
            .expect("cache should hit");
        assert!(result.from_cache);

        let text = fetcher.read_cached_text(&result).await.unwrap();
        assert_eq!(text, "<html>cached</html>");
    }

    #[tokio::test]
    async fn test_expired_cache_misses() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.cache_ttl = Duration::from_secs(0);
        let fetcher = Fetcher::new(config).unwrap();
        let url = Url::parse("https://turtlogs.com/viewer/9/base").unwrap();

        let cache_path = fetcher.cache_path_for_url(&url);
        let meta_path = fetcher.meta_path_for_url(&url);
        fs::create_dir_all(cache_path.parent().unwrap())
            .await
            .unwrap();
        fs::write(&cache_path, "old").await.unwrap();
        let meta = CacheMetadata {
            url: url.to_string(),
            fetched_at: Utc::now() - chrono::Duration::seconds(10),
            content_length: 3,
        };
        fs::write(&meta_path, serde_json::to_string(&meta).unwrap())
            .await
            .unwrap();

        let result = fetcher
            .check_cache(&url, &cache_path, &meta_path)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_is_valid_viewer_url() {
        assert!(is_valid_viewer_url("https://turtlogs.com/viewer/123/base"));
        assert!(is_valid_viewer_url(
            "https://www.turtlogs.com/viewer/123/base"
        ));
        assert!(is_valid_viewer_url(
            "https://turtlogs.com/viewer/123/base?x=1#frag"
        ));
    }

    #[test]
    fn test_is_valid_viewer_url_rejects() {
        assert!(!is_valid_viewer_url("https://example.com/viewer/123/base"));
        assert!(!is_valid_viewer_url("https://turtlogs.com/viewer/abc/base"));
        assert!(!is_valid_viewer_url("https://turtlogs.com/other/123"));
        assert!(!is_valid_viewer_url("not a url"));
        assert!(!is_valid_viewer_url(""));
    }

    #[test]
    fn test_normalize_viewer_url_strips_query_and_case() {
        let a = normalize_viewer_url("https://Turtlogs.com/Viewer/123/Base?foo=1#bar").unwrap();
        let b = normalize_viewer_url("https://turtlogs.com/viewer/123/base").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "https://turtlogs.com/viewer/123/base");
    }

    #[test]
    fn test_split_bulk_urls() {
        let urls = split_bulk_urls("a\nb, c; d  e");
        assert_eq!(urls, vec!["a", "b", "c", "d", "e"]);
        assert!(split_bulk_urls("  \n ,; ").is_empty());
    }
}
