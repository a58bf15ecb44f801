//! The brand context artifact: cached, normalized content derived from a
//! brand's declared sources, plus fetch provenance.
//!
//! Built by `contentforge-context`, persisted as JSON keyed by
//! `(brand_id, fingerprint)`, and handed to the pipeline read-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::brand::SourcePurpose;

/// Current schema version for persisted context artifacts.
pub const CONTEXT_ARTIFACT_VERSION: u32 = 1;

/// Outcome of one source fetch, recorded in provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Body retrieved and normalized.
    Ok,
    /// The host's robots policy disallowed the fetch identity.
    RobotsDisallowed,
    /// Transient failures exhausted the retry budget.
    TransientExhausted,
    /// Local file source did not exist.
    MissingFile,
    /// Non-retryable HTTP or protocol failure.
    Failed,
}

/// Provenance and (optionally) normalized content for one fetched source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedSource {
    pub source_id: String,
    pub purpose: SourcePurpose,
    pub address: String,
    pub status: FetchStatus,
    /// When the fetch was attempted.
    pub fetched_at: DateTime<Utc>,
    /// SHA-256 of the raw body, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Robots decision for URL sources (`None` for file sources).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robots_allowed: Option<bool>,
    /// Normalized plain-text content (capped). Never present for a source
    /// whose fetch was disallowed or failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Failure detail for non-ok statuses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchedSource {
    /// Whether this source was retrieved successfully.
    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }
}

/// Brand signals extracted and merged across all fetched sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandSignals {
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub headings: Vec<String>,
    #[serde(default)]
    pub descriptions: Vec<String>,
    #[serde(default)]
    pub positioning_snippets: Vec<String>,
    #[serde(default)]
    pub key_terms: Vec<String>,
}

/// The persisted brand context record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandContextArtifact {
    pub artifact_version: u32,
    pub brand_id: String,
    /// SHA-256 over brand identity + the ordered (purpose, address) list.
    pub fingerprint: String,
    pub built_at: DateTime<Utc>,
    /// Outbound identity used for every fetch and robots evaluation.
    pub fetch_user_agent: String,
    pub sources: Vec<FetchedSource>,
    pub signals: BrandSignals,
}

impl BrandContextArtifact {
    /// True when every recorded source fetch succeeded.
    pub fn all_sources_ok(&self) -> bool {
        self.sources.iter().all(FetchedSource::is_ok)
    }
}
