//! On-disk persistence for content artifacts.
//!
//! One JSON file per run under `<root>/artifacts/`. The artifact is
//! written before delivery matching, so a delivery failure never loses
//! generated work.

use std::path::{Path, PathBuf};

use tracing::debug;

use contentforge_shared::{ContentArtifact, ContentForgeError, Result, RunId};

/// Filesystem store for content artifacts, keyed by run id.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the artifact file for one run.
    pub fn path_for(&self, run_id: &RunId) -> PathBuf {
        self.root.join("artifacts").join(format!("{run_id}.json"))
    }

    /// Persist an artifact atomically (write to a temp file, then rename).
    pub fn save(&self, artifact: &ContentArtifact) -> Result<PathBuf> {
        let path = self.path_for(&artifact.run_id);
        let dir = path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| ContentForgeError::io(dir, e))?;

        let json = serde_json::to_string_pretty(artifact)
            .map_err(|e| ContentForgeError::Storage(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| ContentForgeError::io(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| ContentForgeError::io(&path, e))?;

        debug!(?path, run_id = %artifact.run_id, "content artifact persisted");
        Ok(path)
    }

    /// Load a previously persisted artifact.
    pub fn load(&self, run_id: &RunId) -> Result<ContentArtifact> {
        let path = self.path_for(run_id);
        let content =
            std::fs::read_to_string(&path).map_err(|e| ContentForgeError::io(&path, e))?;
        serde_json::from_str(&content).map_err(|e| ContentForgeError::Storage(e.to_string()))
    }
}
