//! Deterministic route selection.
//!
//! The routing table is an explicit immutable value mapping supported
//! `(intent, form, channel)` triples to agent sets. Routing is a pure
//! lookup: the same triple always yields the same agent set, and an
//! unmapped triple is a hard error, never a fallback.
//!
//! Product-coupled stages (`PicksDraft`, `PicksRepair`) exist only in
//! agent sets built for product forms. Non-product routes are assembled
//! without them, so product logic cannot leak into a thought-leadership
//! run by construction.

use std::collections::HashMap;

use contentforge_shared::{Channel, ContentForgeError, Form, Intent, Result, RouteKey};

/// Identifier of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Grounds the draft in the brand context and the requested topic.
    TopicDiscovery,
    /// Drafts the thought-leadership body.
    EssayDraft,
    /// Drafts the product picks body. Product forms only.
    PicksDraft,
    /// Produces the artifact title.
    TitlePass,
    /// Structural and vocabulary QA over the accumulated draft.
    PreflightQa,
    /// Advisory tone cleanup.
    ToneRepair,
    /// Repairs the picks list. Product forms only.
    PicksRepair,
    /// Advisory depth expansion for long-form channels.
    DepthExpansion,
}

impl StageId {
    /// Whether this stage reads or writes product picks.
    pub fn is_product_coupled(&self) -> bool {
        matches!(self, Self::PicksDraft | Self::PicksRepair)
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TopicDiscovery => "topic_discovery",
            Self::EssayDraft => "essay_draft",
            Self::PicksDraft => "picks_draft",
            Self::TitlePass => "title_pass",
            Self::PreflightQa => "preflight_qa",
            Self::ToneRepair => "tone_repair",
            Self::PicksRepair => "picks_repair",
            Self::DepthExpansion => "depth_expansion",
        };
        write!(f, "{s}")
    }
}

/// One stage in an agent set. A required stage's failure is fatal to the
/// run; an optional stage's failure is logged and the draft passes
/// through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec {
    pub id: StageId,
    pub required: bool,
}

impl StageSpec {
    pub const fn required(id: StageId) -> Self {
        Self { id, required: true }
    }

    pub const fn optional(id: StageId) -> Self {
        Self { id, required: false }
    }
}

/// What the selected route permits the pipeline to do with products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guardrails {
    /// May the draft contain a product picks section?
    pub allow_product_sections: bool,
    /// May stages parse the request's manual picks list?
    pub allow_picks_parsing: bool,
    /// May repair stages rewrite picks entries?
    pub allow_picks_repair: bool,
}

impl Guardrails {
    /// Guardrails for product-recommendation routes.
    pub const fn product() -> Self {
        Self {
            allow_product_sections: true,
            allow_picks_parsing: true,
            allow_picks_repair: true,
        }
    }

    /// Guardrails for every non-product route.
    pub const fn forbid_products() -> Self {
        Self {
            allow_product_sections: false,
            allow_picks_parsing: false,
            allow_picks_repair: false,
        }
    }

    pub fn forbids_products(&self) -> bool {
        !self.allow_product_sections && !self.allow_picks_parsing && !self.allow_picks_repair
    }
}

/// The ordered stage sequence and guardrails selected for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSet {
    pub stages: Vec<StageSpec>,
    pub guardrails: Guardrails,
}

impl AgentSet {
    fn thought_leadership(channel: Channel) -> Self {
        let mut stages = vec![
            StageSpec::required(StageId::TopicDiscovery),
            StageSpec::required(StageId::EssayDraft),
            StageSpec::required(StageId::TitlePass),
            StageSpec::required(StageId::PreflightQa),
            StageSpec::optional(StageId::ToneRepair),
        ];
        if channel == Channel::BlogArticle {
            stages.push(StageSpec::optional(StageId::DepthExpansion));
        }
        Self {
            stages,
            guardrails: Guardrails::forbid_products(),
        }
    }

    fn product_recommendation() -> Self {
        Self {
            stages: vec![
                StageSpec::required(StageId::TopicDiscovery),
                StageSpec::required(StageId::PicksDraft),
                StageSpec::required(StageId::TitlePass),
                StageSpec::required(StageId::PreflightQa),
                StageSpec::required(StageId::PicksRepair),
                StageSpec::optional(StageId::ToneRepair),
            ],
            guardrails: Guardrails::product(),
        }
    }
}

/// Explicit, immutable routing table. Built once and passed in; never a
/// module-level singleton.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    routes: HashMap<RouteKey, AgentSet>,
}

const THOUGHT_LEADERSHIP_INTENTS: &[Intent] = &[Intent::ThoughtLeadership, Intent::OpinionPov];

const THOUGHT_LEADERSHIP_FORMS: &[Form] = &[
    Form::CoreInsightEssay,
    Form::FrameworkBreakdown,
    Form::ContrarianTake,
    Form::MythsVsReality,
    Form::NarrativeWithLesson,
    Form::MicroCaseStudy,
    Form::QuestionLedExploration,
];

const THOUGHT_LEADERSHIP_CHANNELS: &[Channel] =
    &[Channel::BlogArticle, Channel::Email, Channel::SocialLongform];

const PRODUCT_FORMS: &[Form] = &[
    Form::TopXList,
    Form::InDepthSingleReview,
    Form::ComparisonTable,
    Form::BuyerGuide,
];

const PRODUCT_CHANNELS: &[Channel] = &[Channel::BlogArticle, Channel::Email];

impl RoutingTable {
    /// The shipped routing table. Thought-leadership and opinion intents
    /// route through the essay pipeline; product recommendation routes
    /// through the picks pipeline. Everything else is unmapped.
    pub fn standard() -> Self {
        let mut routes = HashMap::new();

        for &intent in THOUGHT_LEADERSHIP_INTENTS {
            for &form in THOUGHT_LEADERSHIP_FORMS {
                for &channel in THOUGHT_LEADERSHIP_CHANNELS {
                    routes.insert(
                        RouteKey { intent, form, channel },
                        AgentSet::thought_leadership(channel),
                    );
                }
            }
        }

        for &form in PRODUCT_FORMS {
            for &channel in PRODUCT_CHANNELS {
                routes.insert(
                    RouteKey {
                        intent: Intent::ProductRecommendation,
                        form,
                        channel,
                    },
                    AgentSet::product_recommendation(),
                );
            }
        }

        Self { routes }
    }

    /// Resolve the agent set for a triple. Unmapped triples fail with the
    /// offending triple named; there is no default route.
    pub fn route(&self, intent: Intent, form: Form, channel: Channel) -> Result<&AgentSet> {
        self.routes
            .get(&RouteKey { intent, form, channel })
            .ok_or_else(|| ContentForgeError::Routing {
                intent: intent.to_string(),
                form: form.to_string(),
                channel: channel.to_string(),
            })
    }

    /// Number of mapped routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterate over every mapped route.
    pub fn iter(&self) -> impl Iterator<Item = (&RouteKey, &AgentSet)> {
        self.routes.iter()
    }
}
