//! Static and cross-document validation rules.
//!
//! `validate_brand` checks a profile on its own; `validate_request` checks
//! a request against its (already valid) brand. Date comparison uses the
//! local system calendar date; equal-to-today passes.

use chrono::NaiveDate;
use contentforge_shared::{
    BrandProfile, Channel, ContentForgeError, ContentRequest, Destination, Domain, ProductsMode,
    Result, SourcePurpose,
};

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// A single policy violation. Closed set; rendered messages name the
/// specific rule and field so nothing has to be guessed from context.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Violation {
    #[error("brand_sources.sources must not be empty")]
    EmptyBrandSources,

    #[error("brand_sources must include at least one source with purpose in {required:?}; present={present:?}")]
    MissingRequiredPurpose {
        required: Vec<SourcePurpose>,
        present: Vec<SourcePurpose>,
    },

    #[error("topic_policy.allowlist must not be empty")]
    EmptyTopicAllowlist,

    #[error("topic_policy.allowlist must not contain blank entries")]
    BlankTopicEntry,

    #[error("topic_policy.allowlist contains duplicate entry {topic:?}")]
    DuplicateTopicEntry { topic: String },

    #[error("disclaimer {id:?} is required but has empty text")]
    DisclaimerMissingText { id: String },

    #[error("disclaimer {id:?} is required but declares no placement locations")]
    DisclaimerMissingLocations { id: String },

    #[error("brand_id mismatch: request={request} brand={brand}")]
    BrandIdMismatch { request: String, brand: String },

    #[error("publish_date {date} is before today ({today}, local time)")]
    PublishDateInPast { date: NaiveDate, today: NaiveDate },

    #[error("domain {domain:?} is not supported by the brand")]
    DomainNotSupported { domain: Domain },

    #[error("topic {topic:?} is not in the brand's topic allowlist")]
    TopicNotAllowlisted { topic: String },

    #[error("delivery_target.channel {channel} is not allowed by the brand's delivery policy")]
    ChannelNotAllowed { channel: Channel },

    #[error("delivery_target.destination {destination} is not allowed by the brand's delivery policy")]
    DestinationNotAllowed { destination: Destination },

    #[error("products.mode must be manual_list for product recommendation forms")]
    ProductsModeMustBeManualList,

    #[error("products.items must not be empty when products.mode=manual_list")]
    ProductListEmpty,

    #[error("products.mode must be none for non-product forms")]
    ProductsModeMustBeNone,

    #[error("products.items must be empty when products.mode=none")]
    ProductItemsWithModeNone,

    #[error("products.items[{index}].url must not be empty")]
    ProductItemMissingUrl { index: usize },
}

// ---------------------------------------------------------------------------
// ValidationReport
// ---------------------------------------------------------------------------

/// Complete result of one validation pass. All rules run; violations
/// accumulate rather than short-circuiting.
#[derive(Debug, Default)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    fn push(&mut self, v: Violation) {
        self.violations.push(v);
    }

    /// Whether the validated document passed every rule.
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// The collected violations, in rule-evaluation order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// True if the report contains the given violation.
    pub fn contains(&self, v: &Violation) -> bool {
        self.violations.contains(v)
    }

    /// Convert into a `Result`, aggregating every violation into one
    /// [`ContentForgeError::Validation`].
    pub fn into_result(self) -> Result<()> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ContentForgeError::Validation {
                violations: self.violations.iter().map(ToString::to_string).collect(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Brand rules
// ---------------------------------------------------------------------------

/// Validate a brand profile against static policy rules.
pub fn validate_brand(brand: &BrandProfile) -> ValidationReport {
    let mut report = ValidationReport::default();

    if brand.brand_sources.sources.is_empty() {
        report.push(Violation::EmptyBrandSources);
    } else if !brand.brand_sources.require_any_of_purposes.is_empty() {
        let present: Vec<SourcePurpose> = {
            let mut p: Vec<_> = brand
                .brand_sources
                .sources
                .iter()
                .map(|s| s.purpose)
                .collect();
            p.sort();
            p.dedup();
            p
        };
        let required = &brand.brand_sources.require_any_of_purposes;
        if !present.iter().any(|p| required.contains(p)) {
            report.push(Violation::MissingRequiredPurpose {
                required: required.clone(),
                present,
            });
        }
    }

    if brand.topic_policy.allowlist.is_empty() {
        report.push(Violation::EmptyTopicAllowlist);
    } else {
        let mut seen: Vec<&str> = Vec::new();
        for topic in &brand.topic_policy.allowlist {
            let trimmed = topic.trim();
            if trimmed.is_empty() {
                report.push(Violation::BlankTopicEntry);
                continue;
            }
            if seen.contains(&trimmed) {
                report.push(Violation::DuplicateTopicEntry {
                    topic: trimmed.to_string(),
                });
            }
            seen.push(trimmed);
        }
    }

    for disclaimer in brand.disclaimer_policy.required() {
        if disclaimer.text.trim().is_empty() {
            report.push(Violation::DisclaimerMissingText {
                id: disclaimer.id.clone(),
            });
        }
        if disclaimer.locations.is_empty() {
            report.push(Violation::DisclaimerMissingLocations {
                id: disclaimer.id.clone(),
            });
        }
    }

    tracing::debug!(
        brand_id = %brand.brand_id,
        violations = report.violations.len(),
        "brand validation complete"
    );

    report
}

// ---------------------------------------------------------------------------
// Request rules
// ---------------------------------------------------------------------------

/// Validate a request against its brand, using the local calendar date.
pub fn validate_request(request: &ContentRequest, brand: &BrandProfile) -> ValidationReport {
    validate_request_on(request, brand, chrono::Local::now().date_naive())
}

/// Date-injectable form of [`validate_request`].
pub fn validate_request_on(
    request: &ContentRequest,
    brand: &BrandProfile,
    today: NaiveDate,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if request.brand_id != brand.brand_id {
        report.push(Violation::BrandIdMismatch {
            request: request.brand_id.clone(),
            brand: brand.brand_id.clone(),
        });
    }

    // Today-or-future, local system time. Equal-to-today is allowed.
    if request.publish_date < today {
        report.push(Violation::PublishDateInPast {
            date: request.publish_date,
            today,
        });
    }

    if !brand.domains_supported.contains(&request.domain) {
        report.push(Violation::DomainNotSupported {
            domain: request.domain,
        });
    }

    let topic = request.topic.trim();
    if !brand
        .topic_policy
        .allowlist
        .iter()
        .any(|t| t.trim() == topic)
    {
        report.push(Violation::TopicNotAllowlisted {
            topic: topic.to_string(),
        });
    }

    // Channel and destination are each checked individually so the operator
    // learns which half of the target is wrong.
    if !brand
        .delivery_policy
        .channels
        .contains(&request.delivery_target.channel)
    {
        report.push(Violation::ChannelNotAllowed {
            channel: request.delivery_target.channel,
        });
    }
    if !brand
        .delivery_policy
        .destinations
        .contains(&request.delivery_target.destination)
    {
        report.push(Violation::DestinationNotAllowed {
            destination: request.delivery_target.destination,
        });
    }

    if request.form.is_product() {
        match request.products.mode {
            ProductsMode::ManualList => {
                if request.products.items.is_empty() {
                    report.push(Violation::ProductListEmpty);
                }
                for (i, item) in request.products.items.iter().enumerate() {
                    if item.url.trim().is_empty() {
                        report.push(Violation::ProductItemMissingUrl { index: i });
                    }
                }
            }
            ProductsMode::None => report.push(Violation::ProductsModeMustBeManualList),
        }
    } else {
        match request.products.mode {
            ProductsMode::None => {
                if !request.products.items.is_empty() {
                    report.push(Violation::ProductItemsWithModeNone);
                }
            }
            ProductsMode::ManualList => report.push(Violation::ProductsModeMustBeNone),
        }
    }

    tracing::debug!(
        brand_id = %brand.brand_id,
        intent = %request.intent,
        form = %request.form,
        violations = report.violations.len(),
        "request validation complete"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentforge_shared::{
        BrandSource, BrandSources, DeliveryPolicy, DeliveryTarget, Disclaimer, DisclaimerLocation,
        DisclaimerPolicy, Form, Intent, Persona, ProductItem, Products, SourceKind, TopicPolicy,
    };

    fn brand() -> BrandProfile {
        BrandProfile {
            brand_id: "acme_consulting".into(),
            domains_supported: vec![Domain::Leadership],
            voice_persona: Persona::CalmAuthoritative,
            topic_policy: TopicPolicy {
                allowlist: vec!["leadership".into()],
            },
            disclaimer_policy: DisclaimerPolicy {
                disclaimers: vec![Disclaimer {
                    id: "general".into(),
                    required: true,
                    text: "Views are the author's own.".into(),
                    locations: vec![DisclaimerLocation::Footer],
                }],
            },
            delivery_policy: DeliveryPolicy {
                channels: vec![Channel::BlogArticle],
                destinations: vec![Destination::ClientWebsite],
            },
            brand_sources: BrandSources {
                require_any_of_purposes: vec![
                    SourcePurpose::Homepage,
                    SourcePurpose::LinkedinProfile,
                ],
                sources: vec![BrandSource {
                    source_id: "home".into(),
                    kind: SourceKind::Url,
                    purpose: SourcePurpose::Homepage,
                    address: "https://acme.example.com/".into(),
                }],
            },
        }
    }

    fn request() -> ContentRequest {
        ContentRequest {
            brand_id: "acme_consulting".into(),
            intent: Intent::ThoughtLeadership,
            form: Form::CoreInsightEssay,
            domain: Domain::Leadership,
            topic: "leadership".into(),
            publish_date: NaiveDate::from_ymd_opt(2030, 1, 15).unwrap(),
            delivery_target: DeliveryTarget {
                channel: Channel::BlogArticle,
                destination: Destination::ClientWebsite,
            },
            products: Products::default(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    // -----------------------------------------------------------------------
    // Brand rules
    // -----------------------------------------------------------------------

    #[test]
    fn valid_brand_passes() {
        assert!(validate_brand(&brand()).is_ok());
    }

    #[test]
    fn empty_sources_fails_with_the_specific_violation() {
        let mut b = brand();
        b.brand_sources.sources.clear();
        let report = validate_brand(&b);
        assert_eq!(report.violations(), &[Violation::EmptyBrandSources]);
    }

    #[test]
    fn missing_required_purpose_fails() {
        let mut b = brand();
        b.brand_sources.sources[0].purpose = SourcePurpose::Policies;
        let report = validate_brand(&b);
        assert!(matches!(
            report.violations()[0],
            Violation::MissingRequiredPurpose { .. }
        ));
    }

    #[test]
    fn empty_required_purpose_set_is_not_enforced() {
        let mut b = brand();
        b.brand_sources.require_any_of_purposes.clear();
        b.brand_sources.sources[0].purpose = SourcePurpose::Other;
        assert!(validate_brand(&b).is_ok());
    }

    #[test]
    fn empty_allowlist_fails() {
        let mut b = brand();
        b.topic_policy.allowlist.clear();
        assert!(validate_brand(&b).contains(&Violation::EmptyTopicAllowlist));
    }

    #[test]
    fn duplicate_and_blank_allowlist_entries_fail() {
        let mut b = brand();
        b.topic_policy.allowlist = vec!["x".into(), "  ".into(), "x".into()];
        let report = validate_brand(&b);
        assert!(report.contains(&Violation::BlankTopicEntry));
        assert!(report.contains(&Violation::DuplicateTopicEntry { topic: "x".into() }));
    }

    #[test]
    fn required_disclaimer_needs_text_and_locations() {
        let mut b = brand();
        b.disclaimer_policy.disclaimers[0].text = "  ".into();
        b.disclaimer_policy.disclaimers[0].locations.clear();
        let report = validate_brand(&b);
        assert!(report.contains(&Violation::DisclaimerMissingText {
            id: "general".into()
        }));
        assert!(report.contains(&Violation::DisclaimerMissingLocations {
            id: "general".into()
        }));
    }

    #[test]
    fn optional_disclaimer_may_be_empty() {
        let mut b = brand();
        b.disclaimer_policy.disclaimers[0].required = false;
        b.disclaimer_policy.disclaimers[0].text = String::new();
        b.disclaimer_policy.disclaimers[0].locations.clear();
        assert!(validate_brand(&b).is_ok());
    }

    // -----------------------------------------------------------------------
    // Request rules
    // -----------------------------------------------------------------------

    #[test]
    fn valid_request_passes() {
        assert!(validate_request_on(&request(), &brand(), today()).is_ok());
    }

    #[test]
    fn past_publish_date_fails_regardless_of_other_fields() {
        let mut r = request();
        r.publish_date = NaiveDate::from_ymd_opt(2026, 5, 31).unwrap();
        let report = validate_request_on(&r, &brand(), today());
        assert_eq!(
            report.violations(),
            &[Violation::PublishDateInPast {
                date: r.publish_date,
                today: today(),
            }]
        );
    }

    #[test]
    fn publish_date_equal_to_today_passes() {
        let mut r = request();
        r.publish_date = today();
        assert!(validate_request_on(&r, &brand(), today()).is_ok());
    }

    #[test]
    fn brand_id_mismatch_fails() {
        let mut r = request();
        r.brand_id = "other_brand".into();
        let report = validate_request_on(&r, &brand(), today());
        assert!(matches!(
            report.violations()[0],
            Violation::BrandIdMismatch { .. }
        ));
    }

    #[test]
    fn unsupported_domain_fails() {
        let mut r = request();
        r.domain = Domain::Pets;
        assert!(
            validate_request_on(&r, &brand(), today())
                .contains(&Violation::DomainNotSupported { domain: Domain::Pets })
        );
    }

    #[test]
    fn topic_outside_allowlist_fails() {
        let mut r = request();
        r.topic = "cryptocurrency".into();
        assert!(validate_request_on(&r, &brand(), today()).contains(
            &Violation::TopicNotAllowlisted {
                topic: "cryptocurrency".into()
            }
        ));
    }

    #[test]
    fn channel_and_destination_fail_distinctly() {
        let mut r = request();
        r.delivery_target.channel = Channel::Email;
        r.delivery_target.destination = Destination::EmailList;
        let report = validate_request_on(&r, &brand(), today());
        assert!(report.contains(&Violation::ChannelNotAllowed {
            channel: Channel::Email
        }));
        assert!(report.contains(&Violation::DestinationNotAllowed {
            destination: Destination::EmailList
        }));
        assert_eq!(report.violations().len(), 2);
    }

    #[test]
    fn product_form_requires_manual_list() {
        let mut b = brand();
        b.topic_policy.allowlist.push("standing desks".into());
        let mut r = request();
        r.intent = Intent::ProductRecommendation;
        r.form = Form::TopXList;
        r.topic = "standing desks".into();
        // products.mode left at none
        let report = validate_request_on(&r, &b, today());
        assert!(report.contains(&Violation::ProductsModeMustBeManualList));
    }

    #[test]
    fn product_form_with_empty_items_fails() {
        let mut b = brand();
        b.topic_policy.allowlist.push("standing desks".into());
        let mut r = request();
        r.intent = Intent::ProductRecommendation;
        r.form = Form::TopXList;
        r.topic = "standing desks".into();
        r.products = Products {
            mode: ProductsMode::ManualList,
            items: vec![],
        };
        assert!(validate_request_on(&r, &b, today()).contains(&Violation::ProductListEmpty));
    }

    #[test]
    fn non_product_form_rejects_manual_list() {
        let mut r = request();
        r.products = Products {
            mode: ProductsMode::ManualList,
            items: vec![ProductItem {
                pick_id: "p1".into(),
                title: "Desk".into(),
                url: "https://shop.example.com/desk".into(),
            }],
        };
        assert!(
            validate_request_on(&r, &brand(), today())
                .contains(&Violation::ProductsModeMustBeNone)
        );
    }

    #[test]
    fn product_item_without_url_fails() {
        let mut b = brand();
        b.topic_policy.allowlist.push("standing desks".into());
        let mut r = request();
        r.intent = Intent::ProductRecommendation;
        r.form = Form::TopXList;
        r.topic = "standing desks".into();
        r.products = Products {
            mode: ProductsMode::ManualList,
            items: vec![ProductItem {
                pick_id: "p1".into(),
                title: "Desk".into(),
                url: "  ".into(),
            }],
        };
        assert!(
            validate_request_on(&r, &b, today())
                .contains(&Violation::ProductItemMissingUrl { index: 0 })
        );
    }

    #[test]
    fn violations_accumulate_across_rules() {
        let mut r = request();
        r.publish_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        r.domain = Domain::Tech;
        r.topic = "gadgets".into();
        r.delivery_target.channel = Channel::SocialLongform;
        let report = validate_request_on(&r, &brand(), today());
        assert_eq!(report.violations().len(), 4);
    }

    #[test]
    fn report_converts_to_aggregated_error() {
        let mut b = brand();
        b.brand_sources.sources.clear();
        b.topic_policy.allowlist.clear();
        let err = validate_brand(&b).into_result().unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("brand_sources.sources must not be empty"));
        assert!(rendered.contains("topic_policy.allowlist must not be empty"));
    }
}
