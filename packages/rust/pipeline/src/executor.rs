//! Pipeline execution.
//!
//! Runs an agent set's stages in declared order over the request and the
//! brand context, applies the brand's required disclaimers, and verifies
//! the disclaimer post-condition before emitting the artifact.
//!
//! A required stage's failure aborts the run. An optional stage's failure
//! is logged and the draft passes through unchanged.

use chrono::Utc;
use tracing::{debug, info, warn};

use contentforge_shared::{
    AppliedDisclaimer, Block, BrandContextArtifact, BrandProfile, ContentArtifact,
    ContentForgeError, ContentRequest, DisclaimerLocation, Result, RouteKey, RunId, Section,
    CONTENT_ARTIFACT_VERSION,
};

use crate::router::{AgentSet, StageId};
use crate::stages::{stage_for, Draft, DraftTransform, StageContext};

/// Run the agent set with the shipped stage implementations.
pub fn execute(
    run_id: RunId,
    request: &ContentRequest,
    brand: &BrandProfile,
    context: &BrandContextArtifact,
    agent_set: &AgentSet,
) -> Result<ContentArtifact> {
    execute_with(run_id, request, brand, context, agent_set, &stage_for)
}

/// Run the agent set with a caller-supplied stage resolver. The resolver
/// seam exists so tests can substitute failing or recording stages.
pub fn execute_with(
    run_id: RunId,
    request: &ContentRequest,
    brand: &BrandProfile,
    context: &BrandContextArtifact,
    agent_set: &AgentSet,
    resolve: &dyn Fn(StageId) -> Box<dyn DraftTransform>,
) -> Result<ContentArtifact> {
    let route = RouteKey {
        intent: request.intent,
        form: request.form,
        channel: request.delivery_target.channel,
    };
    info!(%run_id, %route, stages = agent_set.stages.len(), "executing pipeline");

    let ctx = StageContext {
        request,
        brand,
        context,
        guardrails: &agent_set.guardrails,
    };

    let mut draft = Draft::default();
    for spec in &agent_set.stages {
        let stage = resolve(spec.id);
        match stage.apply(draft.clone(), &ctx) {
            Ok(next) => {
                debug!(stage = %spec.id, "stage completed");
                draft = next;
            }
            Err(e) if spec.required => {
                return Err(e);
            }
            Err(e) => {
                warn!(stage = %spec.id, error = %e, "optional stage failed, draft unchanged");
            }
        }
    }

    let title = draft
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            ContentForgeError::post_condition("pipeline finished without producing a title")
        })?;

    let (sections, disclaimers_applied) = apply_disclaimers(draft.sections, brand);

    let artifact = ContentArtifact {
        artifact_version: CONTENT_ARTIFACT_VERSION,
        run_id,
        brand_id: brand.brand_id.clone(),
        route,
        generated_at: Utc::now(),
        title,
        sections,
        products: draft.products,
        disclaimers_applied,
        delivery_target: request.delivery_target,
    };

    verify_disclaimers(&artifact, brand)?;
    Ok(artifact)
}

/// Place every `required = true` disclaimer at each of its declared
/// locations. `before_products` goes immediately before the picks
/// section when one exists, otherwise at the end of the body.
fn apply_disclaimers(
    mut sections: Vec<Section>,
    brand: &BrandProfile,
) -> (Vec<Section>, Vec<AppliedDisclaimer>) {
    let mut applied = Vec::new();
    // Header placements stack after each other so declared order holds.
    let mut header_at = 0usize;

    for disclaimer in brand.disclaimer_policy.required() {
        for &location in &disclaimer.locations {
            let mut section = Section::new(
                format!("disclaimer_{}_{location}", disclaimer.id),
                None,
            );
            section.blocks.push(Block::callout(disclaimer.text.clone()));

            match location {
                DisclaimerLocation::Header => {
                    sections.insert(header_at, section);
                    header_at += 1;
                }
                DisclaimerLocation::Footer => sections.push(section),
                DisclaimerLocation::BeforeProducts => {
                    match sections.iter().position(|s| s.id == "picks") {
                        Some(index) => sections.insert(index, section),
                        None => sections.push(section),
                    }
                }
            }
            applied.push(AppliedDisclaimer {
                id: disclaimer.id.clone(),
                location,
            });
        }
    }

    (sections, applied)
}

/// Post-condition: the artifact carries every required disclaimer at
/// every declared location, with its text present in the body.
fn verify_disclaimers(artifact: &ContentArtifact, brand: &BrandProfile) -> Result<()> {
    let body = artifact.plain_text();

    for disclaimer in brand.disclaimer_policy.required() {
        for &location in &disclaimer.locations {
            let recorded = artifact.disclaimers_applied.iter().any(|a| {
                a.id == disclaimer.id && a.location == location
            });
            if !recorded {
                return Err(ContentForgeError::post_condition(format!(
                    "required disclaimer {:?} was not applied at {location}",
                    disclaimer.id
                )));
            }
        }
        if disclaimer.text.trim().is_empty() || !body.contains(disclaimer.text.trim()) {
            return Err(ContentForgeError::post_condition(format!(
                "required disclaimer {:?} text is missing from the artifact body",
                disclaimer.id
            )));
        }
    }

    Ok(())
}
