//! Pipeline stages.
//!
//! Every stage implements [`DraftTransform`]: it consumes the accumulated
//! draft plus the request and brand context, and returns an updated draft
//! or a stage-local failure. Stages are deterministic; all grounding
//! comes from the brand context artifact, never from network access.

use contentforge_shared::{
    Block, BrandContextArtifact, BrandProfile, ContentForgeError, ContentRequest, ProductItem,
    Result, Section,
};

use crate::router::{Guardrails, StageId};

/// Vocabulary that must never appear in non-product output.
pub const BANNED_COMMERCE_TERMS: &[&str] = &[
    "buy now",
    "add to cart",
    "affiliate link",
    "discount code",
    "limited time offer",
    "best deals",
    "our top picks",
];

/// The accumulated draft a pipeline run threads through its stages.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub title: Option<String>,
    pub sections: Vec<Section>,
    pub products: Option<Vec<ProductItem>>,
}

impl Draft {
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// All body text joined, for vocabulary-level checks.
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

/// Read-only inputs shared by every stage in a run.
pub struct StageContext<'a> {
    pub request: &'a ContentRequest,
    pub brand: &'a BrandProfile,
    pub context: &'a BrandContextArtifact,
    pub guardrails: &'a Guardrails,
}

/// The capability seam every stage implements.
pub trait DraftTransform {
    fn id(&self) -> StageId;

    /// Apply this stage. Errors are stage-local; the executor decides
    /// whether they are fatal based on the agent set's declaration.
    fn apply(&self, draft: Draft, ctx: &StageContext<'_>) -> Result<Draft>;
}

/// Resolve the shipped implementation of a stage.
pub fn stage_for(id: StageId) -> Box<dyn DraftTransform> {
    match id {
        StageId::TopicDiscovery => Box::new(TopicDiscovery),
        StageId::EssayDraft => Box::new(EssayDraft),
        StageId::PicksDraft => Box::new(PicksDraft),
        StageId::TitlePass => Box::new(TitlePass),
        StageId::PreflightQa => Box::new(PreflightQa),
        StageId::ToneRepair => Box::new(ToneRepair),
        StageId::PicksRepair => Box::new(PicksRepair),
        StageId::DepthExpansion => Box::new(DepthExpansion),
    }
}

fn stage_err(id: StageId, message: impl Into<String>) -> ContentForgeError {
    ContentForgeError::stage(id.to_string(), message)
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Stage implementations
// ---------------------------------------------------------------------------

/// Opens the draft with the topic, grounded in the brand's positioning.
struct TopicDiscovery;

impl DraftTransform for TopicDiscovery {
    fn id(&self) -> StageId {
        StageId::TopicDiscovery
    }

    fn apply(&self, mut draft: Draft, ctx: &StageContext<'_>) -> Result<Draft> {
        let topic = ctx.request.topic.trim();
        if topic.is_empty() {
            return Err(stage_err(self.id(), "request topic is empty"));
        }

        let mut intro = Section::new("intro", None);
        intro
            .blocks
            .push(Block::paragraph(format!("Topic: {topic}.")));
        if let Some(snippet) = ctx.context.signals.positioning_snippets.first() {
            intro
                .blocks
                .push(Block::callout(format!("Brand positioning: {snippet}")));
        }
        draft.sections.push(intro);
        Ok(draft)
    }
}

/// Drafts the thought-leadership body from the topic and brand signals.
struct EssayDraft;

impl DraftTransform for EssayDraft {
    fn id(&self) -> StageId {
        StageId::EssayDraft
    }

    fn apply(&self, mut draft: Draft, ctx: &StageContext<'_>) -> Result<Draft> {
        let topic = ctx.request.topic.trim();
        let signals = &ctx.context.signals;

        let mut core = Section::new("core_idea", Some(&title_case(topic)));
        core.blocks.push(Block::paragraph(format!(
            "A perspective on {topic}, written in the brand's established voice."
        )));
        if let Some(heading) = signals.headings.first() {
            core.blocks.push(Block::paragraph(format!(
                "It builds on how the brand already talks about its work: \"{heading}\"."
            )));
        }
        draft.sections.push(core);

        let terms: Vec<String> = signals.key_terms.iter().take(3).cloned().collect();
        if !terms.is_empty() {
            let mut implications = Section::new("implications", Some("What this means"));
            implications.blocks.push(Block::bullets(
                terms
                    .into_iter()
                    .map(|t| format!("How {t} shapes the day-to-day.")),
            ));
            draft.sections.push(implications);
        }

        Ok(draft)
    }
}

/// Drafts the picks section from the request's manual product list.
struct PicksDraft;

impl DraftTransform for PicksDraft {
    fn id(&self) -> StageId {
        StageId::PicksDraft
    }

    fn apply(&self, mut draft: Draft, ctx: &StageContext<'_>) -> Result<Draft> {
        if !ctx.guardrails.allow_picks_parsing {
            return Err(stage_err(self.id(), "picks parsing is not permitted on this route"));
        }
        let items = &ctx.request.products.items;
        if items.is_empty() {
            return Err(stage_err(self.id(), "manual picks list is empty"));
        }

        let mut picks = Section::new("picks", Some("The picks"));
        picks.blocks.push(Block {
            kind: contentforge_shared::BlockKind::Numbered,
            text: None,
            items: items.iter().map(|p| format!("{} ({})", p.title, p.url)).collect(),
        });
        draft.sections.push(picks);
        draft.products = Some(items.clone());
        Ok(draft)
    }
}

/// Produces the artifact title.
struct TitlePass;

impl DraftTransform for TitlePass {
    fn id(&self) -> StageId {
        StageId::TitlePass
    }

    fn apply(&self, mut draft: Draft, ctx: &StageContext<'_>) -> Result<Draft> {
        let topic = title_case(ctx.request.topic.trim());
        let title = match &draft.products {
            Some(items) => format!("Top {} {topic} Picks", items.len()),
            None => {
                let voice = ctx
                    .context
                    .signals
                    .titles
                    .first()
                    .cloned()
                    .unwrap_or_else(|| ctx.brand.brand_id.clone());
                format!("{topic}: Notes from {voice}")
            }
        };
        draft.title = Some(title);
        Ok(draft)
    }
}

/// Structural and vocabulary QA. All findings are reported together.
struct PreflightQa;

impl DraftTransform for PreflightQa {
    fn id(&self) -> StageId {
        StageId::PreflightQa
    }

    fn apply(&self, draft: Draft, ctx: &StageContext<'_>) -> Result<Draft> {
        let mut problems: Vec<String> = Vec::new();

        if draft.title.as_deref().map(str::trim).unwrap_or("").is_empty() {
            problems.push("draft has no title".into());
        }
        if draft.sections.iter().all(|s| s.blocks.is_empty()) {
            problems.push("draft has no body content".into());
        }

        if ctx.guardrails.allow_product_sections {
            match draft.section("picks") {
                Some(picks) if picks.blocks.iter().any(|b| !b.items.is_empty()) => {}
                _ => problems.push("product route produced no picks section".into()),
            }
        } else {
            if draft.section("picks").is_some() || draft.products.is_some() {
                problems.push("non-product route produced a product section".into());
            }
            let text = draft.plain_text().to_lowercase();
            for term in BANNED_COMMERCE_TERMS {
                if text.contains(term) {
                    problems.push(format!("banned commerce vocabulary: {term:?}"));
                }
            }
        }

        if problems.is_empty() {
            Ok(draft)
        } else {
            Err(stage_err(self.id(), problems.join("; ")))
        }
    }
}

/// Advisory tone cleanup: collapses shouting and stray whitespace.
struct ToneRepair;

impl DraftTransform for ToneRepair {
    fn id(&self) -> StageId {
        StageId::ToneRepair
    }

    fn apply(&self, mut draft: Draft, _ctx: &StageContext<'_>) -> Result<Draft> {
        for section in &mut draft.sections {
            for block in &mut section.blocks {
                if let Some(text) = &mut block.text {
                    *text = soften(text);
                }
                for item in &mut block.items {
                    *item = soften(item);
                }
            }
        }
        Ok(draft)
    }
}

fn soften(text: &str) -> String {
    let mut out = text.split_whitespace().collect::<Vec<_>>().join(" ");
    while out.contains("!!") {
        out = out.replace("!!", "!");
    }
    out
}

/// Repairs the picks list: drops duplicate pick ids, keeping first wins.
struct PicksRepair;

impl DraftTransform for PicksRepair {
    fn id(&self) -> StageId {
        StageId::PicksRepair
    }

    fn apply(&self, mut draft: Draft, ctx: &StageContext<'_>) -> Result<Draft> {
        if !ctx.guardrails.allow_picks_repair {
            return Err(stage_err(self.id(), "picks repair is not permitted on this route"));
        }
        let Some(products) = draft.products.take() else {
            return Err(stage_err(self.id(), "no picks to repair"));
        };

        let mut seen: Vec<String> = Vec::new();
        let deduped: Vec<ProductItem> = products
            .into_iter()
            .filter(|p| {
                if seen.contains(&p.pick_id) {
                    false
                } else {
                    seen.push(p.pick_id.clone());
                    true
                }
            })
            .collect();

        if let Some(picks) = draft.sections.iter_mut().find(|s| s.id == "picks") {
            for block in &mut picks.blocks {
                if !block.items.is_empty() {
                    block.items = deduped
                        .iter()
                        .map(|p| format!("{} ({})", p.title, p.url))
                        .collect();
                }
            }
        }

        draft.products = Some(deduped);
        Ok(draft)
    }
}

/// Advisory depth expansion: appends a closing section built from the
/// brand's key terms. Fails (advisorily) when there is nothing to expand
/// from.
struct DepthExpansion;

impl DraftTransform for DepthExpansion {
    fn id(&self) -> StageId {
        StageId::DepthExpansion
    }

    fn apply(&self, mut draft: Draft, ctx: &StageContext<'_>) -> Result<Draft> {
        let terms: Vec<String> = ctx.context.signals.key_terms.iter().take(5).cloned().collect();
        if terms.is_empty() {
            return Err(stage_err(self.id(), "no brand signals to expand from"));
        }

        let mut deeper = Section::new("going_deeper", Some("Going deeper"));
        deeper.blocks.push(Block::bullets(
            terms.into_iter().map(|t| format!("Where {t} fits in the bigger picture.")),
        ));
        draft.sections.push(deeper);
        Ok(draft)
    }
}
