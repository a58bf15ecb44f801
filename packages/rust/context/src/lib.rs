//! Brand context building and caching.
//!
//! A context build fetches every declared brand source (robots-gated,
//! via `contentforge-fetcher`), normalizes the bodies, extracts merged
//! brand signals, and persists the result as a [`BrandContextArtifact`]
//! keyed by `(brand_id, fingerprint)`.
//!
//! Invariants:
//! - all-or-nothing: if any declared source fails, the build fails and
//!   nothing is persisted
//! - at most one build runs per cache key at a time; concurrent callers
//!   for the same key wait and reuse the winner's artifact
//! - editing the source list (order included) changes the fingerprint
//!   and invalidates the cached artifact

mod store;

pub use store::ContextStore;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, Semaphore};
use tracing::{info, warn};

use contentforge_fetcher::{signals, Fetcher, FETCH_USER_AGENT};
use contentforge_shared::{
    BrandContextArtifact, BrandProfile, BrandSignals, BrandSource, ContentForgeError, FetchConfig,
    FetchStatus, FetchedSource, Result, CONTEXT_ARTIFACT_VERSION,
};

/// Cache fingerprint for a brand's declared source list: SHA-256 over the
/// brand id and each `(purpose, address)` pair in declared order.
pub fn source_fingerprint(brand: &BrandProfile) -> String {
    let mut hasher = Sha256::new();
    hasher.update(brand.brand_id.as_bytes());
    for source in &brand.brand_sources.sources {
        hasher.update(b"\x1f");
        hasher.update(source.purpose.to_string().as_bytes());
        hasher.update(b"\x1e");
        hasher.update(source.address.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Context cache: lookup, and build-on-miss with per-key serialization.
pub struct ContextCache {
    store: ContextStore,
    fetcher: Arc<Fetcher>,
    concurrency: usize,
    building: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ContextCache {
    /// Create a cache rooted at `root`, fetching under `config`.
    pub fn new(root: impl Into<PathBuf>, config: FetchConfig) -> Result<Self> {
        let concurrency = config.concurrency.max(1) as usize;
        Ok(Self {
            store: ContextStore::new(root),
            fetcher: Arc::new(Fetcher::new(config)?),
            concurrency,
            building: Mutex::new(HashMap::new()),
        })
    }

    /// Cache lookup only. `None` when absent or invalidated.
    pub fn lookup(&self, brand: &BrandProfile) -> Result<Option<BrandContextArtifact>> {
        self.store.load(&brand.brand_id, &source_fingerprint(brand))
    }

    /// Return the cached artifact for this brand, building it if absent.
    /// Concurrent callers for the same `(brand_id, fingerprint)` key are
    /// serialized; only one of them performs the fetch work.
    pub async fn get_or_build(&self, brand: &BrandProfile) -> Result<BrandContextArtifact> {
        let fingerprint = source_fingerprint(brand);
        if let Some(artifact) = self.store.load(&brand.brand_id, &fingerprint)? {
            return Ok(artifact);
        }

        let key = format!("{}:{fingerprint}", brand.brand_id);
        let key_lock = {
            let mut building = self.building.lock().await;
            building.entry(key.clone()).or_default().clone()
        };

        let guard = key_lock.lock().await;
        let result = self.build_locked(brand, &fingerprint).await;
        drop(guard);
        self.release_key(&key, &key_lock).await;
        result
    }

    /// The under-lock half of `get_or_build`: a concurrent caller may
    /// have completed the build while we waited, so re-check the store
    /// before fetching.
    async fn build_locked(
        &self,
        brand: &BrandProfile,
        fingerprint: &str,
    ) -> Result<BrandContextArtifact> {
        if let Some(artifact) = self.store.load(&brand.brand_id, fingerprint)? {
            return Ok(artifact);
        }

        let artifact = self.build(brand, fingerprint).await?;
        self.store.save(&artifact)?;
        Ok(artifact)
    }

    /// Drop the per-key lock slot once no other caller holds it, so the
    /// map does not retain an entry for every key ever built.
    async fn release_key(&self, key: &str, lock: &Arc<Mutex<()>>) {
        let mut building = self.building.lock().await;
        if let Some(entry) = building.get(key) {
            // strong_count == 2 means the map entry and our clone only.
            if Arc::ptr_eq(entry, lock) && Arc::strong_count(lock) == 2 {
                building.remove(key);
            }
        }
    }

    /// Fetch every declared source and assemble the artifact. Fails with
    /// an aggregated report if any source fails; persists nothing here.
    async fn build(&self, brand: &BrandProfile, fingerprint: &str) -> Result<BrandContextArtifact> {
        info!(
            brand_id = %brand.brand_id,
            sources = brand.brand_sources.sources.len(),
            "building brand context"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(brand.brand_sources.sources.len());

        for (index, source) in brand.brand_sources.sources.iter().enumerate() {
            let fetcher = self.fetcher.clone();
            let semaphore = semaphore.clone();
            let source = source.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await;
                (index, fetch_source(&fetcher, &source).await)
            }));
        }

        let mut fetched: Vec<Option<(FetchedSource, Option<BrandSignals>)>> =
            vec![None; brand.brand_sources.sources.len()];
        for handle in handles {
            let (index, record) = handle
                .await
                .map_err(|e| ContentForgeError::fetch(format!("fetch task panicked: {e}")))?;
            fetched[index] = Some(record);
        }
        let (sources, per_source_signals): (Vec<FetchedSource>, Vec<Option<BrandSignals>>) =
            fetched.into_iter().flatten().unzip();

        let failures: Vec<String> = sources
            .iter()
            .filter(|s| !s.is_ok())
            .map(|s| {
                format!(
                    "{} ({}): {}",
                    s.source_id,
                    s.address,
                    s.error.as_deref().unwrap_or("fetch failed")
                )
            })
            .collect();
        if !failures.is_empty() {
            warn!(brand_id = %brand.brand_id, failed = failures.len(), "context build failed");
            return Err(ContentForgeError::ContextBuild { failures });
        }

        let merged = signals::merge_signals(per_source_signals.into_iter().flatten());

        Ok(BrandContextArtifact {
            artifact_version: CONTEXT_ARTIFACT_VERSION,
            brand_id: brand.brand_id.clone(),
            fingerprint: fingerprint.to_string(),
            built_at: Utc::now(),
            fetch_user_agent: FETCH_USER_AGENT.to_string(),
            sources,
            signals: merged,
        })
    }
}

/// Fetch one source and record its provenance. Signals are extracted
/// from the raw body; the stored content is the normalized, capped text.
/// Failures are captured in the record rather than returned, so the
/// caller can aggregate them.
async fn fetch_source(
    fetcher: &Fetcher,
    source: &BrandSource,
) -> (FetchedSource, Option<BrandSignals>) {
    let fetched_at = Utc::now();

    match fetcher.fetch(source).await {
        Ok(doc) => {
            let extracted = signals::extract_signals(&doc.body);
            let record = FetchedSource {
                source_id: source.source_id.clone(),
                purpose: source.purpose,
                address: source.address.clone(),
                status: FetchStatus::Ok,
                fetched_at,
                sha256: Some(doc.sha256),
                bytes_len: Some(doc.bytes_len),
                http_status: doc.http_status,
                robots_allowed: doc.robots_allowed,
                content: Some(signals::normalize_text(&doc.body)),
                error: None,
            };
            (record, Some(extracted))
        }
        Err(failure) => {
            let record = FetchedSource {
                source_id: source.source_id.clone(),
                purpose: source.purpose,
                address: source.address.clone(),
                status: failure.status(),
                fetched_at,
                sha256: None,
                bytes_len: None,
                http_status: None,
                robots_allowed: match failure {
                    contentforge_fetcher::FetchFailure::RobotsDisallowed { .. } => Some(false),
                    _ => None,
                },
                content: None,
                error: Some(failure.to_string()),
            };
            (record, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentforge_shared::{
        BrandSources, Channel, DeliveryPolicy, Destination, Domain, Persona, SourceKind,
        SourcePurpose, TopicPolicy,
    };
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> FetchConfig {
        FetchConfig {
            timeout_secs: 5,
            retries: 1,
            retry_backoff_ms: 1,
            rate_limit_ms: 0,
            concurrency: 4,
        }
    }

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cf-ctx-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn brand_with_sources(sources: Vec<BrandSource>) -> BrandProfile {
        BrandProfile {
            brand_id: "acme_consulting".into(),
            domains_supported: vec![Domain::Leadership],
            voice_persona: Persona::CalmAuthoritative,
            topic_policy: TopicPolicy {
                allowlist: vec!["leadership".into()],
            },
            disclaimer_policy: Default::default(),
            delivery_policy: DeliveryPolicy {
                channels: vec![Channel::BlogArticle],
                destinations: vec![Destination::ClientWebsite],
            },
            brand_sources: BrandSources {
                require_any_of_purposes: vec![],
                sources,
            },
        }
    }

    fn url_source(id: &str, purpose: SourcePurpose, address: String) -> BrandSource {
        BrandSource {
            source_id: id.into(),
            kind: SourceKind::Url,
            purpose,
            address,
        }
    }

    async fn mock_site(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><head><title>Acme Consulting</title></head>\
                 <body><h1>Leadership without hype</h1></body></html>",
            ))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn build_fetches_sources_and_persists() {
        let server = MockServer::start().await;
        mock_site(&server).await;

        let root = temp_root();
        let cache = ContextCache::new(&root, test_config()).unwrap();
        let brand = brand_with_sources(vec![url_source(
            "home",
            SourcePurpose::Homepage,
            format!("{}/", server.uri()),
        )]);

        let artifact = cache.get_or_build(&brand).await.unwrap();
        assert!(artifact.all_sources_ok());
        assert_eq!(artifact.fetch_user_agent, FETCH_USER_AGENT);
        assert!(artifact.signals.titles.contains(&"Acme Consulting".to_string()));

        // Persisted: a fresh cache over the same root sees it.
        let cache2 = ContextCache::new(&root, test_config()).unwrap();
        assert!(cache2.lookup(&brand).unwrap().is_some());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn second_build_is_served_from_cache() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>home</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let root = temp_root();
        let cache = ContextCache::new(&root, test_config()).unwrap();
        let brand = brand_with_sources(vec![url_source(
            "home",
            SourcePurpose::Homepage,
            format!("{}/", server.uri()),
        )]);

        let first = cache.get_or_build(&brand).await.unwrap();
        let second = cache.get_or_build(&brand).await.unwrap();
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.built_at, second.built_at);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn robots_disallowed_source_fails_the_whole_build() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"),
            )
            .mount(&server)
            .await;

        let root = temp_root();
        let cache = ContextCache::new(&root, test_config()).unwrap();
        let brand = brand_with_sources(vec![url_source(
            "home",
            SourcePurpose::Homepage,
            format!("{}/", server.uri()),
        )]);

        let err = cache.get_or_build(&brand).await.unwrap_err();
        match err {
            ContentForgeError::ContextBuild { failures } => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].contains("home"));
            }
            other => panic!("expected ContextBuild, got {other:?}"),
        }

        // No partial artifact was persisted.
        assert!(cache.lookup(&brand).unwrap().is_none());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn all_failures_are_reported_together() {
        let root = temp_root();
        let cache = ContextCache::new(&root, test_config()).unwrap();
        let brand = brand_with_sources(vec![
            BrandSource {
                source_id: "notes".into(),
                kind: SourceKind::File,
                purpose: SourcePurpose::Other,
                address: "/nonexistent/a.md".into(),
            },
            BrandSource {
                source_id: "more_notes".into(),
                kind: SourceKind::File,
                purpose: SourcePurpose::Other,
                address: "/nonexistent/b.md".into(),
            },
        ]);

        let err = cache.get_or_build(&brand).await.unwrap_err();
        match err {
            ContentForgeError::ContextBuild { failures } => {
                assert_eq!(failures.len(), 2);
                assert!(failures.iter().any(|f| f.contains("notes")));
                assert!(failures.iter().any(|f| f.contains("more_notes")));
            }
            other => panic!("expected ContextBuild, got {other:?}"),
        }

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn editing_the_source_list_invalidates_the_cache() {
        let server = MockServer::start().await;
        mock_site(&server).await;

        Mock::given(method("GET"))
            .and(path("/about"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>about</html>"))
            .mount(&server)
            .await;

        let root = temp_root();
        let cache = ContextCache::new(&root, test_config()).unwrap();

        let brand = brand_with_sources(vec![url_source(
            "home",
            SourcePurpose::Homepage,
            format!("{}/", server.uri()),
        )]);
        cache.get_or_build(&brand).await.unwrap();

        let edited = brand_with_sources(vec![
            url_source("home", SourcePurpose::Homepage, format!("{}/", server.uri())),
            url_source("about", SourcePurpose::AboutPage, format!("{}/about", server.uri())),
        ]);
        assert_ne!(source_fingerprint(&brand), source_fingerprint(&edited));
        assert!(cache.lookup(&edited).unwrap().is_none());

        let rebuilt = cache.get_or_build(&edited).await.unwrap();
        assert_eq!(rebuilt.sources.len(), 2);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn source_order_is_part_of_the_fingerprint() {
        let a = url_source("home", SourcePurpose::Homepage, "https://x.example/".into());
        let b = url_source("about", SourcePurpose::AboutPage, "https://x.example/about".into());

        let forward = brand_with_sources(vec![a.clone(), b.clone()]);
        let reversed = brand_with_sources(vec![b, a]);
        assert_ne!(source_fingerprint(&forward), source_fingerprint(&reversed));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_build() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html>home</html>")
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let root = temp_root();
        let cache = Arc::new(ContextCache::new(&root, test_config()).unwrap());
        let brand = Arc::new(brand_with_sources(vec![url_source(
            "home",
            SourcePurpose::Homepage,
            format!("{}/", server.uri()),
        )]));

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let cache = cache.clone();
                let brand = brand.clone();
                tokio::spawn(async move { cache.get_or_build(&brand).await })
            })
            .collect();

        let mut built_at = None;
        for task in tasks {
            let artifact = task.await.unwrap().unwrap();
            match built_at {
                None => built_at = Some(artifact.built_at),
                Some(t) => assert_eq!(artifact.built_at, t),
            }
        }

        assert!(cache.building.lock().await.is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn per_key_lock_is_released_after_the_build() {
        let server = MockServer::start().await;
        mock_site(&server).await;

        let root = temp_root();
        let cache = ContextCache::new(&root, test_config()).unwrap();

        let brand = brand_with_sources(vec![url_source(
            "home",
            SourcePurpose::Homepage,
            format!("{}/", server.uri()),
        )]);
        cache.get_or_build(&brand).await.unwrap();
        assert!(cache.building.lock().await.is_empty());

        // A failed build releases its slot too.
        let broken = brand_with_sources(vec![BrandSource {
            source_id: "notes".into(),
            kind: SourceKind::File,
            purpose: SourcePurpose::Other,
            address: "/nonexistent/a.md".into(),
        }]);
        cache.get_or_build(&broken).await.unwrap_err();
        assert!(cache.building.lock().await.is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }
}
