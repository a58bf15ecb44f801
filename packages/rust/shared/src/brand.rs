//! Brand profile documents.
//!
//! Authored by the client, fully validated at load time by
//! `contentforge-policy`, immutable for the duration of a run. Every
//! enum-like field is a closed enum: unknown values are rejected at the
//! serde boundary instead of flowing downstream as strings.

use serde::{Deserialize, Serialize};

use crate::request::{Channel, Destination};

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Content domain a brand can publish in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Leadership,
    Finance,
    Health,
    Pets,
    Home,
    Kitchen,
    Tech,
}

/// Voice persona applied across the brand's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    PracticalExpert,
    WarmReflective,
    MinimalistDirect,
    DeeplyTechnical,
    CalmAuthoritative,
    DirectInsightDense,
    ProvocativeChallenger,
}

/// How a brand source is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Url,
    File,
}

/// Declared purpose of a brand source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePurpose {
    Homepage,
    LinkedinProfile,
    AboutPage,
    ServicesPage,
    ProductPages,
    Policies,
    LongformContent,
    Other,
}

impl std::fmt::Display for SourcePurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Homepage => "homepage",
            Self::LinkedinProfile => "linkedin_profile",
            Self::AboutPage => "about_page",
            Self::ServicesPage => "services_page",
            Self::ProductPages => "product_pages",
            Self::Policies => "policies",
            Self::LongformContent => "longform_content",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Where a disclaimer must be placed in the rendered artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisclaimerLocation {
    Header,
    Footer,
    BeforeProducts,
}

impl std::fmt::Display for DisclaimerLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Header => "header",
            Self::Footer => "footer",
            Self::BeforeProducts => "before_products",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Policy sections
// ---------------------------------------------------------------------------

/// Topics the brand is willing to publish on. Allowlist-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicPolicy {
    /// Ordered, non-empty list of allowed topics.
    pub allowlist: Vec<String>,
}

/// A single disclaimer the brand may require on its output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disclaimer {
    /// Stable identifier (referenced by `disclaimers_applied`).
    pub id: String,
    /// Whether the disclaimer must appear on every artifact.
    pub required: bool,
    /// Disclaimer text. Must be non-empty when `required`.
    #[serde(default)]
    pub text: String,
    /// Placement locations. Must be non-empty when `required`.
    #[serde(default)]
    pub locations: Vec<DisclaimerLocation>,
}

/// The brand's disclaimer set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisclaimerPolicy {
    #[serde(default)]
    pub disclaimers: Vec<Disclaimer>,
}

impl DisclaimerPolicy {
    /// Iterate over the disclaimers marked `required = true`.
    pub fn required(&self) -> impl Iterator<Item = &Disclaimer> {
        self.disclaimers.iter().filter(|d| d.required)
    }
}

/// Channels and destinations the brand allows deliveries to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPolicy {
    pub channels: Vec<Channel>,
    pub destinations: Vec<Destination>,
}

// ---------------------------------------------------------------------------
// Brand sources
// ---------------------------------------------------------------------------

/// A single declared context source (URL or local file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandSource {
    /// Stable identifier used in fetch provenance.
    pub source_id: String,
    pub kind: SourceKind,
    pub purpose: SourcePurpose,
    /// URL (for `kind = url`) or filesystem path (for `kind = file`).
    pub address: String,
}

/// The ordered source list plus the brand's required-purpose set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandSources {
    /// At least one source's purpose must be in this set (when non-empty).
    #[serde(default)]
    pub require_any_of_purposes: Vec<SourcePurpose>,
    /// Ordered, non-empty source list. Order is part of the cache fingerprint.
    pub sources: Vec<BrandSource>,
}

// ---------------------------------------------------------------------------
// BrandProfile
// ---------------------------------------------------------------------------

/// A client's validated configuration of allowed topics, disclaimers,
/// delivery channels, and context sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandProfile {
    /// Stable, unique brand identifier.
    pub brand_id: String,
    /// Domains the brand publishes in.
    pub domains_supported: Vec<Domain>,
    /// Brand-wide voice persona.
    pub voice_persona: Persona,
    pub topic_policy: TopicPolicy,
    #[serde(default)]
    pub disclaimer_policy: DisclaimerPolicy,
    pub delivery_policy: DeliveryPolicy,
    pub brand_sources: BrandSources,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_toml() -> &'static str {
        r#"
brand_id = "acme_consulting"
domains_supported = ["leadership", "tech"]
voice_persona = "calm_authoritative"

[topic_policy]
allowlist = ["leadership", "decision making"]

[[disclaimer_policy.disclaimers]]
id = "general"
required = true
text = "Views are the author's own."
locations = ["footer"]

[delivery_policy]
channels = ["blog_article", "email"]
destinations = ["client_website", "email_list"]

[brand_sources]
require_any_of_purposes = ["homepage", "linkedin_profile"]

[[brand_sources.sources]]
source_id = "home"
kind = "url"
purpose = "homepage"
address = "https://acme.example.com/"
"#
    }

    #[test]
    fn brand_profile_parses_from_toml() {
        let brand: BrandProfile = toml::from_str(profile_toml()).expect("parse brand");
        assert_eq!(brand.brand_id, "acme_consulting");
        assert_eq!(brand.domains_supported.len(), 2);
        assert_eq!(brand.brand_sources.sources[0].purpose, SourcePurpose::Homepage);
        assert_eq!(brand.disclaimer_policy.required().count(), 1);
    }

    #[test]
    fn unknown_enum_value_is_rejected() {
        let doc = profile_toml().replace("calm_authoritative", "extremely_chill");
        let result: std::result::Result<BrandProfile, _> = toml::from_str(&doc);
        assert!(result.is_err());
    }

    #[test]
    fn brand_profile_json_roundtrip() {
        let brand: BrandProfile = toml::from_str(profile_toml()).expect("parse brand");
        let json = serde_json::to_string(&brand).expect("serialize");
        let parsed: BrandProfile = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.brand_id, brand.brand_id);
        assert_eq!(parsed.voice_persona, Persona::CalmAuthoritative);
    }
}
