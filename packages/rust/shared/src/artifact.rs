//! The compiled content artifact: the pipeline's final output.
//!
//! Immutable once emitted; consumed by the delivery matcher and persisted
//! as JSON so a failed delivery never loses generated work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::brand::DisclaimerLocation;
use crate::request::{Channel, DeliveryTarget, Form, Intent, ProductItem};

/// Current schema version for persisted content artifacts.
pub const CONTENT_ARTIFACT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Blocks and sections
// ---------------------------------------------------------------------------

/// Kind of a content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Bullets,
    Numbered,
    Callout,
    Quote,
    Divider,
}

/// A single content block. `text` carries paragraph/callout/quote bodies,
/// `items` carries list entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: Some(text.into()),
            items: Vec::new(),
        }
    }

    pub fn bullets(items: impl IntoIterator<Item = String>) -> Self {
        Self {
            kind: BlockKind::Bullets,
            text: None,
            items: items.into_iter().collect(),
        }
    }

    pub fn callout(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Callout,
            text: Some(text.into()),
            items: Vec::new(),
        }
    }

    /// Plain-text rendering of this block's content.
    pub fn plain_text(&self) -> String {
        match self.kind {
            BlockKind::Paragraph | BlockKind::Callout | BlockKind::Quote => {
                self.text.clone().unwrap_or_default()
            }
            BlockKind::Bullets => self
                .items
                .iter()
                .map(|it| format!("- {it}"))
                .collect::<Vec<_>>()
                .join("\n"),
            BlockKind::Numbered => self
                .items
                .iter()
                .enumerate()
                .map(|(i, it)| format!("{}. {it}", i + 1))
                .collect::<Vec<_>>()
                .join("\n"),
            BlockKind::Divider => "---".into(),
        }
    }
}

/// A titled run of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Stable section identifier (`intro`, `core_idea`, `picks`, ...).
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(id: impl Into<String>, heading: Option<&str>) -> Self {
        Self {
            id: id.into(),
            heading: heading.map(str::to_string),
            blocks: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ContentArtifact
// ---------------------------------------------------------------------------

/// The (intent, form, channel) triple a run was routed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteKey {
    pub intent: Intent,
    pub form: Form,
    pub channel: Channel,
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.intent, self.form, self.channel)
    }
}

/// Record of one disclaimer placement in the finished artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDisclaimer {
    pub id: String,
    pub location: DisclaimerLocation,
}

/// Output of the pipeline executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentArtifact {
    pub artifact_version: u32,
    pub run_id: RunId,
    pub brand_id: String,
    pub route: RouteKey,
    pub generated_at: DateTime<Utc>,
    pub title: String,
    pub sections: Vec<Section>,
    /// Present exactly when the route's form is a product form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<ProductItem>>,
    pub disclaimers_applied: Vec<AppliedDisclaimer>,
    pub delivery_target: DeliveryTarget,
}

impl ContentArtifact {
    /// Find a section by its stable id.
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// All body text joined for vocabulary-level checks.
    pub fn plain_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for sec in &self.sections {
            if let Some(h) = &sec.heading {
                parts.push(h.clone());
            }
            for b in &sec.blocks {
                let t = b.plain_text();
                if !t.is_empty() {
                    parts.push(t);
                }
            }
        }
        parts.join("\n")
    }
}
