//! Delivery adapters and the adapter registry.
//!
//! An adapter declares the exact `(channel, destination)` pairs it can
//! render for. Matching is exact: no match is an `AdapterMismatch`, more
//! than one match is an `AdapterAmbiguous`. There is never a best-effort
//! pick.

pub mod blog;
pub mod email;
pub mod linkedin;

pub use blog::BlogAdapter;
pub use email::EmailAdapter;
pub use linkedin::LinkedinAdapter;

use tracing::debug;

use contentforge_shared::{
    Channel, ContentArtifact, ContentForgeError, DeliveryTarget, Destination, Result,
};

/// A rendered delivery payload, ready to be written out.
#[derive(Debug, Clone)]
pub struct RenderedDelivery {
    /// Name of the adapter that produced this payload.
    pub adapter: &'static str,
    /// Suggested output file name.
    pub file_name: String,
    pub body: String,
}

/// A delivery adapter: declares its supported pairs and renders artifacts
/// for them. Adapters are matched, never mutated.
pub trait DeliveryAdapter: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// The exact `(channel, destination)` pairs this adapter serves.
    fn supports(&self) -> &[(Channel, Destination)];

    /// Render the artifact for this adapter's channel. Channel-level QA
    /// (length limits and the like) happens here and is fatal.
    fn render(&self, artifact: &ContentArtifact) -> Result<RenderedDelivery>;
}

/// The set of registered delivery adapters.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn DeliveryAdapter>>,
}

impl AdapterRegistry {
    /// The shipped adapters: blog, email, and LinkedIn.
    pub fn standard() -> Self {
        Self::with_adapters(vec![
            Box::new(BlogAdapter),
            Box::new(EmailAdapter),
            Box::new(LinkedinAdapter),
        ])
    }

    /// Build a registry from an explicit adapter list.
    pub fn with_adapters(adapters: Vec<Box<dyn DeliveryAdapter>>) -> Self {
        Self { adapters }
    }

    /// Select the single adapter whose declared pairs contain the
    /// artifact's delivery target.
    pub fn match_adapter(&self, artifact: &ContentArtifact) -> Result<&dyn DeliveryAdapter> {
        self.match_target(&artifact.delivery_target)
    }

    /// Exact-pair adapter lookup for a delivery target.
    pub fn match_target(&self, target: &DeliveryTarget) -> Result<&dyn DeliveryAdapter> {
        let matches: Vec<&dyn DeliveryAdapter> = self
            .adapters
            .iter()
            .filter(|a| {
                a.supports()
                    .iter()
                    .any(|&(c, d)| c == target.channel && d == target.destination)
            })
            .map(|a| a.as_ref())
            .collect();

        match matches.as_slice() {
            [single] => {
                debug!(adapter = single.name(), "delivery adapter matched");
                Ok(*single)
            }
            [] => Err(ContentForgeError::AdapterMismatch {
                channel: target.channel.to_string(),
                destination: target.destination.to_string(),
            }),
            many => Err(ContentForgeError::AdapterAmbiguous {
                channel: target.channel.to_string(),
                destination: target.destination.to_string(),
                names: many.iter().map(|a| a.name().to_string()).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contentforge_shared::{
        Form, Intent, RouteKey, RunId, CONTENT_ARTIFACT_VERSION,
    };

    pub(crate) fn artifact(channel: Channel, destination: Destination) -> ContentArtifact {
        ContentArtifact {
            artifact_version: CONTENT_ARTIFACT_VERSION,
            run_id: RunId::new(),
            brand_id: "acme_consulting".into(),
            route: RouteKey {
                intent: Intent::ThoughtLeadership,
                form: Form::CoreInsightEssay,
                channel,
            },
            generated_at: Utc::now(),
            title: "On Constraints".into(),
            sections: vec![],
            products: None,
            disclaimers_applied: vec![],
            delivery_target: DeliveryTarget {
                channel,
                destination,
            },
        }
    }

    #[test]
    fn exact_pair_matches_one_adapter() {
        let registry = AdapterRegistry::standard();
        let artifact = artifact(Channel::BlogArticle, Destination::ClientWebsite);
        let adapter = registry.match_adapter(&artifact).unwrap();
        assert_eq!(adapter.name(), "blog");

        let email = artifact_for_email();
        assert_eq!(registry.match_adapter(&email).unwrap().name(), "email");
    }

    fn artifact_for_email() -> ContentArtifact {
        artifact(Channel::Email, Destination::EmailList)
    }

    #[test]
    fn unshipped_pair_is_a_mismatch() {
        let registry = AdapterRegistry::standard();
        let artifact = artifact(Channel::VideoScript, Destination::Tiktok);
        let err = registry.match_adapter(&artifact).unwrap_err();
        match err {
            ContentForgeError::AdapterMismatch {
                channel,
                destination,
            } => {
                assert_eq!(channel, "video_script");
                assert_eq!(destination, "tiktok");
            }
            other => panic!("expected AdapterMismatch, got {other:?}"),
        }
    }

    #[test]
    fn overlapping_adapters_are_ambiguous() {
        #[derive(Debug)]
        struct Impostor;
        impl DeliveryAdapter for Impostor {
            fn name(&self) -> &'static str {
                "impostor"
            }
            fn supports(&self) -> &[(Channel, Destination)] {
                &[(Channel::BlogArticle, Destination::ClientWebsite)]
            }
            fn render(&self, _artifact: &ContentArtifact) -> Result<RenderedDelivery> {
                unreachable!("never matched unambiguously")
            }
        }

        let registry =
            AdapterRegistry::with_adapters(vec![Box::new(BlogAdapter), Box::new(Impostor)]);
        let artifact = artifact(Channel::BlogArticle, Destination::ClientWebsite);
        let err = registry.match_adapter(&artifact).unwrap_err();
        match err {
            ContentForgeError::AdapterAmbiguous { names, .. } => {
                assert_eq!(names, vec!["blog", "impostor"]);
            }
            other => panic!("expected AdapterAmbiguous, got {other:?}"),
        }
    }
}
