//! Deterministic routing and pipeline execution.
//!
//! [`router`] maps a validated `(intent, form, channel)` triple to an
//! ordered agent set with guardrail flags; [`stages`] holds the stage
//! implementations behind the [`stages::DraftTransform`] seam;
//! [`executor`] runs a selected agent set over a request and its brand
//! context; [`store`] persists the resulting artifact.

pub mod executor;
pub mod router;
pub mod stages;
pub mod store;

pub use executor::{execute, execute_with};
pub use router::{AgentSet, Guardrails, RoutingTable, StageId, StageSpec};
pub use stages::{Draft, DraftTransform, StageContext, BANNED_COMMERCE_TERMS};
pub use store::ArtifactStore;
