//! Shared domain types, error model, and configuration for ContentForge.
//!
//! - [`brand`] — Brand profile documents (policies, sources, persona)
//! - [`request`] — Content request documents (intent/form/channel, products)
//! - [`context`] — The cached brand context artifact and fetch provenance
//! - [`artifact`] — The compiled content artifact (sections, blocks, disclaimers)
//! - [`error`] — `ContentForgeError` and the crate-wide `Result` alias
//! - [`config`] — TOML app config (`~/.contentforge/contentforge.toml`)

pub mod artifact;
pub mod brand;
pub mod config;
pub mod context;
pub mod error;
pub mod request;

pub use artifact::{
    AppliedDisclaimer, Block, BlockKind, CONTENT_ARTIFACT_VERSION, ContentArtifact, RouteKey,
    RunId, Section,
};
pub use brand::{
    BrandProfile, BrandSource, BrandSources, DeliveryPolicy, Disclaimer, DisclaimerLocation,
    DisclaimerPolicy, Domain, Persona, SourceKind, SourcePurpose, TopicPolicy,
};
pub use config::{AppConfig, FetchConfig, config_dir, init_config, load_config, load_config_from};
pub use context::{
    BrandContextArtifact, BrandSignals, CONTEXT_ARTIFACT_VERSION, FetchStatus, FetchedSource,
};
pub use error::{ContentForgeError, Result};
pub use request::{
    Channel, ContentRequest, DeliveryTarget, Destination, Form, Intent, ProductItem, Products,
    ProductsMode,
};
