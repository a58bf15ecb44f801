//! Brand source fetching under a per-host crawl policy.
//!
//! This crate provides:
//! - [`Fetcher`] — robots-gated, retrying, read-only source retrieval
//! - [`robots`] — robots.txt parsing and agent-specific evaluation
//! - [`signals`] — brand signal extraction from fetched bodies
//!
//! The fetch identity is fixed: [`FETCH_USER_AGENT`] is sent as the
//! `User-Agent` on every outbound request and is the subject evaluated
//! against each host's robots policy.

pub mod robots;
pub mod signals;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use contentforge_shared::{BrandSource, FetchConfig, FetchStatus, SourceKind};

use crate::robots::RobotsPolicy;

/// Fixed outbound client identity for source retrieval and robots checks.
pub const FETCH_USER_AGENT: &str = concat!("ContentForge-Fetcher/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A successfully retrieved source body.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Raw body, decoded as UTF-8 (lossy for file sources).
    pub body: String,
    /// SHA-256 of the raw bytes.
    pub sha256: String,
    pub bytes_len: usize,
    /// HTTP status for URL sources; `None` for files.
    pub http_status: Option<u16>,
    /// Robots decision for URL sources; `None` for files.
    pub robots_allowed: Option<bool>,
}

/// Why a source fetch failed. Robots decisions and 4xx responses are
/// policy/configuration outcomes and are never retried; only transport
/// faults and 5xx responses consume the retry budget.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchFailure {
    #[error("robots policy disallows fetching {url}")]
    RobotsDisallowed { url: String },

    #[error("robots.txt fetch failed for {url}: HTTP {status}")]
    RobotsUnavailable { url: String, status: u16 },

    #[error("{url}: transient failures exhausted {attempts} attempts: {last_error}")]
    TransientExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("{url}: HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("source file not found: {path}")]
    MissingFile { path: PathBuf },

    #[error("invalid source address {address:?}: {message}")]
    InvalidAddress { address: String, message: String },

    #[error("I/O error reading {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl FetchFailure {
    /// Provenance status recorded for this failure.
    pub fn status(&self) -> FetchStatus {
        match self {
            Self::RobotsDisallowed { .. } => FetchStatus::RobotsDisallowed,
            Self::TransientExhausted { .. } => FetchStatus::TransientExhausted,
            Self::MissingFile { .. } => FetchStatus::MissingFile,
            Self::RobotsUnavailable { .. }
            | Self::Http { .. }
            | Self::InvalidAddress { .. }
            | Self::Io { .. } => FetchStatus::Failed,
        }
    }
}

/// Per-source fetch result.
pub type FetchResult = std::result::Result<FetchedDocument, FetchFailure>;

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Pacing state for one host. Held across a request so fetches to the
/// same host serialize; distinct hosts proceed concurrently.
#[derive(Debug, Default)]
struct HostState {
    next_allowed: Option<Instant>,
}

/// Robots-gated, read-only source fetcher with bounded retries.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    robots_cache: Mutex<HashMap<String, Arc<RobotsPolicy>>>,
    hosts: Mutex<HashMap<String, Arc<Mutex<HostState>>>>,
}

impl Fetcher {
    /// Create a fetcher with the given runtime configuration.
    pub fn new(config: FetchConfig) -> contentforge_shared::Result<Self> {
        let client = Client::builder()
            .user_agent(FETCH_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                contentforge_shared::ContentForgeError::fetch(format!(
                    "failed to build HTTP client: {e}"
                ))
            })?;

        Ok(Self {
            client,
            config,
            robots_cache: Mutex::new(HashMap::new()),
            hosts: Mutex::new(HashMap::new()),
        })
    }

    /// Fetch one brand source. URL sources are robots-gated; file sources
    /// are read-only local reads.
    pub async fn fetch(&self, source: &BrandSource) -> FetchResult {
        match source.kind {
            SourceKind::Url => self.fetch_url(&source.address).await,
            SourceKind::File => fetch_file(&source.address),
        }
    }

    async fn fetch_url(&self, address: &str) -> FetchResult {
        let url = Url::parse(address).map_err(|e| FetchFailure::InvalidAddress {
            address: address.to_string(),
            message: e.to_string(),
        })?;

        let robots = self.robots_for(&url).await?;
        let path = full_path(&url);
        if !robots.allows(FETCH_USER_AGENT, &path) {
            debug!(%url, "robots policy disallows fetch");
            return Err(FetchFailure::RobotsDisallowed {
                url: url.to_string(),
            });
        }
        let crawl_delay = robots.crawl_delay(FETCH_USER_AGENT);

        let (status, bytes) = self.get_with_retries(&url, crawl_delay).await?;
        if !(200..300).contains(&status) {
            return Err(FetchFailure::Http {
                url: url.to_string(),
                status,
            });
        }

        Ok(FetchedDocument {
            sha256: compute_sha256(&bytes),
            bytes_len: bytes.len(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
            http_status: Some(status),
            robots_allowed: Some(true),
        })
    }

    /// Robots policy for the URL's host, fetched once per host per run.
    /// A 404 robots.txt allows everything; any other non-200 is fatal.
    async fn robots_for(&self, url: &Url) -> std::result::Result<Arc<RobotsPolicy>, FetchFailure> {
        let key = host_key(url);

        {
            let cache = self.robots_cache.lock().await;
            if let Some(policy) = cache.get(&key) {
                return Ok(policy.clone());
            }
        }

        let robots_url = url
            .join("/robots.txt")
            .map_err(|e| FetchFailure::InvalidAddress {
                address: url.to_string(),
                message: e.to_string(),
            })?;

        let (status, bytes) = self.get_with_retries(&robots_url, None).await?;
        let policy = match status {
            404 => RobotsPolicy::allow_all(),
            s if (200..300).contains(&s) => {
                RobotsPolicy::parse(&String::from_utf8_lossy(&bytes))
            }
            s => {
                return Err(FetchFailure::RobotsUnavailable {
                    url: robots_url.to_string(),
                    status: s,
                });
            }
        };

        let policy = Arc::new(policy);
        self.robots_cache.lock().await.insert(key, policy.clone());
        Ok(policy)
    }

    /// GET with host pacing and a bounded retry budget for transient
    /// faults (transport errors and 5xx). 4xx responses return as-is.
    async fn get_with_retries(
        &self,
        url: &Url,
        crawl_delay: Option<Duration>,
    ) -> std::result::Result<(u16, Vec<u8>), FetchFailure> {
        let gate = self.host_gate(url).await;
        let interval = crawl_delay
            .unwrap_or_default()
            .max(Duration::from_millis(self.config.rate_limit_ms));

        let attempts = self.config.retries + 1;
        let mut last_error = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                let backoff = Duration::from_millis(
                    self.config.retry_backoff_ms.saturating_mul(1 << (attempt - 1)),
                );
                tokio::time::sleep(backoff).await;
            }

            // Serialize requests to this host and honor its pacing.
            let mut state = gate.lock().await;
            if let Some(next) = state.next_allowed {
                tokio::time::sleep_until(next).await;
            }

            let result = self.client.get(url.as_str()).send().await;
            state.next_allowed = Some(Instant::now() + interval);

            match result {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if response.status().is_server_error() {
                        last_error = format!("HTTP {status}");
                        warn!(%url, status, attempt, "transient server error");
                        continue;
                    }
                    let bytes = match response.bytes().await {
                        Ok(b) => b.to_vec(),
                        Err(e) => {
                            last_error = format!("body read failed: {e}");
                            warn!(%url, attempt, error = %last_error, "transient body error");
                            continue;
                        }
                    };
                    return Ok((status, bytes));
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(%url, attempt, error = %last_error, "transient transport error");
                }
            }
        }

        Err(FetchFailure::TransientExhausted {
            url: url.to_string(),
            attempts,
            last_error,
        })
    }

    async fn host_gate(&self, url: &Url) -> Arc<Mutex<HostState>> {
        let key = host_key(url);
        let mut hosts = self.hosts.lock().await;
        hosts.entry(key).or_default().clone()
    }
}

/// Read-only local file source. Missing file is fatal, never retried.
fn fetch_file(address: &str) -> FetchResult {
    let path = PathBuf::from(address);
    if !path.exists() {
        return Err(FetchFailure::MissingFile { path });
    }

    let bytes = std::fs::read(&path).map_err(|e| FetchFailure::Io {
        path: path.clone(),
        message: e.to_string(),
    })?;

    Ok(FetchedDocument {
        sha256: compute_sha256(&bytes),
        bytes_len: bytes.len(),
        body: String::from_utf8_lossy(&bytes).into_owned(),
        http_status: None,
        robots_allowed: None,
    })
}

/// Host identity for pacing and robots caching (host + port).
fn host_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Path + query, as evaluated against robots patterns.
fn full_path(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{q}", url.path()),
        None => url.path().to_string(),
    }
}

/// Compute SHA-256 hash of content.
fn compute_sha256(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
