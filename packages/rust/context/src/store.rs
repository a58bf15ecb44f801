//! On-disk persistence for brand context artifacts.
//!
//! One JSON file per brand under `<root>/context/`. A stored artifact is
//! only returned when its fingerprint matches the current source list
//! and its schema version is current; anything else reads as a miss.

use std::path::{Path, PathBuf};

use tracing::debug;

use contentforge_shared::{
    BrandContextArtifact, ContentForgeError, Result, CONTEXT_ARTIFACT_VERSION,
};

/// Filesystem store for context artifacts, keyed by brand id.
#[derive(Debug, Clone)]
pub struct ContextStore {
    root: PathBuf,
}

impl ContextStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the artifact file for one brand.
    pub fn path_for(&self, brand_id: &str) -> PathBuf {
        self.root.join("context").join(format!("{brand_id}.json"))
    }

    /// Load the stored artifact for `(brand_id, fingerprint)`. A missing
    /// file, a stale fingerprint, or an old schema version is a miss, not
    /// an error.
    pub fn load(&self, brand_id: &str, fingerprint: &str) -> Result<Option<BrandContextArtifact>> {
        let path = self.path_for(brand_id);
        if !path.exists() {
            return Ok(None);
        }

        let content =
            std::fs::read_to_string(&path).map_err(|e| ContentForgeError::io(&path, e))?;
        let artifact: BrandContextArtifact = match serde_json::from_str(&content) {
            Ok(a) => a,
            Err(e) => {
                debug!(?path, error = %e, "unreadable context artifact, treating as miss");
                return Ok(None);
            }
        };

        if artifact.artifact_version != CONTEXT_ARTIFACT_VERSION {
            debug!(?path, version = artifact.artifact_version, "stale artifact version");
            return Ok(None);
        }
        if artifact.fingerprint != fingerprint {
            debug!(?path, "fingerprint mismatch, source list changed");
            return Ok(None);
        }
        // An artifact with recorded fetch failures is never served; the
        // caller rebuilds the full source set.
        if !artifact.all_sources_ok() {
            debug!(?path, "stored artifact has failed sources, rebuilding");
            return Ok(None);
        }

        Ok(Some(artifact))
    }

    /// Persist an artifact atomically (write to a temp file, then rename).
    pub fn save(&self, artifact: &BrandContextArtifact) -> Result<PathBuf> {
        let path = self.path_for(&artifact.brand_id);
        let dir = path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| ContentForgeError::io(dir, e))?;

        let json = serde_json::to_string_pretty(artifact)
            .map_err(|e| ContentForgeError::Storage(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| ContentForgeError::io(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| ContentForgeError::io(&path, e))?;

        debug!(?path, brand_id = %artifact.brand_id, "context artifact persisted");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contentforge_shared::BrandSignals;

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cf-store-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn artifact(brand_id: &str, fingerprint: &str) -> BrandContextArtifact {
        BrandContextArtifact {
            artifact_version: CONTEXT_ARTIFACT_VERSION,
            brand_id: brand_id.into(),
            fingerprint: fingerprint.into(),
            built_at: Utc::now(),
            fetch_user_agent: "ua".into(),
            sources: vec![],
            signals: BrandSignals::default(),
        }
    }

    #[test]
    fn save_then_load_roundtrips() {
        let root = temp_root();
        let store = ContextStore::new(&root);
        store.save(&artifact("acme", "fp1")).unwrap();

        let loaded = store.load("acme", "fp1").unwrap().unwrap();
        assert_eq!(loaded.brand_id, "acme");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_file_is_a_miss() {
        let root = temp_root();
        let store = ContextStore::new(&root);
        assert!(store.load("nobody", "fp").unwrap().is_none());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn fingerprint_mismatch_is_a_miss() {
        let root = temp_root();
        let store = ContextStore::new(&root);
        store.save(&artifact("acme", "old-fp")).unwrap();
        assert!(store.load("acme", "new-fp").unwrap().is_none());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn stale_version_is_a_miss() {
        let root = temp_root();
        let store = ContextStore::new(&root);
        let mut old = artifact("acme", "fp");
        old.artifact_version = 0;
        store.save(&old).unwrap();
        assert!(store.load("acme", "fp").unwrap().is_none());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn artifact_with_failed_sources_is_a_miss() {
        use contentforge_shared::{FetchStatus, FetchedSource, SourcePurpose};

        let root = temp_root();
        let store = ContextStore::new(&root);
        let mut broken = artifact("acme", "fp");
        broken.sources.push(FetchedSource {
            source_id: "home".into(),
            purpose: SourcePurpose::Homepage,
            address: "https://acme.example.com/".into(),
            status: FetchStatus::TransientExhausted,
            fetched_at: Utc::now(),
            sha256: None,
            bytes_len: None,
            http_status: None,
            robots_allowed: None,
            content: None,
            error: Some("gave up".into()),
        });
        store.save(&broken).unwrap();
        assert!(store.load("acme", "fp").unwrap().is_none());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn corrupt_file_is_a_miss() {
        let root = temp_root();
        let store = ContextStore::new(&root);
        let path = store.path_for("acme");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert!(store.load("acme", "fp").unwrap().is_none());
        let _ = std::fs::remove_dir_all(&root);
    }
}
