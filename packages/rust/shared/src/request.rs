//! Content request documents.
//!
//! One request per run, validated against its brand profile before use,
//! discarded after the run completes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Intent / form / channel
// ---------------------------------------------------------------------------

/// What the requested piece is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ProductRecommendation,
    ProductEducation,
    ThoughtLeadership,
    OpinionPov,
    DigestCuration,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ProductRecommendation => "product_recommendation",
            Self::ProductEducation => "product_education",
            Self::ThoughtLeadership => "thought_leadership",
            Self::OpinionPov => "opinion_pov",
            Self::DigestCuration => "digest_curation",
        };
        write!(f, "{s}")
    }
}

/// Structural form of the piece. Product forms and thought-leadership forms
/// share one closed enum; [`Form::is_product`] is the single split point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Form {
    // Product-recommendation forms
    TopXList,
    InDepthSingleReview,
    ComparisonTable,
    BuyerGuide,
    // Thought-leadership forms
    CoreInsightEssay,
    FrameworkBreakdown,
    ContrarianTake,
    MythsVsReality,
    NarrativeWithLesson,
    MicroCaseStudy,
    QuestionLedExploration,
}

impl Form {
    /// Whether this form recommends products (and therefore requires a
    /// manual product list and the picks-coupled pipeline stages).
    pub fn is_product(&self) -> bool {
        matches!(
            self,
            Self::TopXList | Self::InDepthSingleReview | Self::ComparisonTable | Self::BuyerGuide
        )
    }
}

impl std::fmt::Display for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TopXList => "top_x_list",
            Self::InDepthSingleReview => "in_depth_single_review",
            Self::ComparisonTable => "comparison_table",
            Self::BuyerGuide => "buyer_guide",
            Self::CoreInsightEssay => "core_insight_essay",
            Self::FrameworkBreakdown => "framework_breakdown",
            Self::ContrarianTake => "contrarian_take",
            Self::MythsVsReality => "myths_vs_reality",
            Self::NarrativeWithLesson => "narrative_with_lesson",
            Self::MicroCaseStudy => "micro_case_study",
            Self::QuestionLedExploration => "question_led_exploration",
        };
        write!(f, "{s}")
    }
}

/// Delivery channel of the finished piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    BlogArticle,
    Email,
    SocialLongform,
    SocialShortform,
    VideoScript,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BlogArticle => "blog_article",
            Self::Email => "email",
            Self::SocialLongform => "social_longform",
            Self::SocialShortform => "social_shortform",
            Self::VideoScript => "video_script",
        };
        write!(f, "{s}")
    }
}

/// Concrete destination a delivery is published to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    HostedByUs,
    ClientWebsite,
    Linkedin,
    EmailList,
    Tiktok,
    InternalOnly,
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::HostedByUs => "hosted_by_us",
            Self::ClientWebsite => "client_website",
            Self::Linkedin => "linkedin",
            Self::EmailList => "email_list",
            Self::Tiktok => "tiktok",
            Self::InternalOnly => "internal_only",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Product sourcing mode. Manual links only; no discovery of products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductsMode {
    None,
    ManualList,
}

/// A single manually supplied product pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductItem {
    pub pick_id: String,
    pub title: String,
    pub url: String,
}

/// The request's product payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Products {
    pub mode: ProductsMode,
    #[serde(default)]
    pub items: Vec<ProductItem>,
}

impl Default for Products {
    fn default() -> Self {
        Self {
            mode: ProductsMode::None,
            items: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ContentRequest
// ---------------------------------------------------------------------------

/// Channel + destination the finished artifact must be delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTarget {
    pub channel: Channel,
    pub destination: Destination,
}

/// A single content production request against a brand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRequest {
    /// Must reference an existing validated brand profile.
    pub brand_id: String,
    pub intent: Intent,
    pub form: Form,
    pub domain: crate::brand::Domain,
    /// Requested topic. Must be a member of the brand's allowlist.
    pub topic: String,
    /// Must be today or later (local calendar date).
    pub publish_date: NaiveDate,
    pub delivery_target: DeliveryTarget,
    #[serde(default)]
    pub products: Products,
}
