//! LinkedIn delivery: renders a plain-text long-form post. Posts over
//! the platform's 3000-character limit are a fatal render error, not
//! silently truncated.

use contentforge_shared::{Channel, ContentArtifact, ContentForgeError, Destination, Result};

use crate::{DeliveryAdapter, RenderedDelivery};

/// LinkedIn's long-form post character limit.
pub const POST_MAX_CHARS: usize = 3000;

#[derive(Debug)]
pub struct LinkedinAdapter;

const SUPPORTED: &[(Channel, Destination)] = &[(Channel::SocialLongform, Destination::Linkedin)];

impl DeliveryAdapter for LinkedinAdapter {
    fn name(&self) -> &'static str {
        "linkedin"
    }

    fn supports(&self) -> &[(Channel, Destination)] {
        SUPPORTED
    }

    fn render(&self, artifact: &ContentArtifact) -> Result<RenderedDelivery> {
        let body = format!("{}\n\n{}", artifact.title, artifact.plain_text());

        let chars = body.chars().count();
        if chars > POST_MAX_CHARS {
            return Err(ContentForgeError::post_condition(format!(
                "linkedin post is {chars} characters, over the {POST_MAX_CHARS} limit"
            )));
        }

        Ok(RenderedDelivery {
            adapter: self.name(),
            file_name: format!("{}-linkedin.txt", artifact.run_id),
            body,
        })
    }
}
