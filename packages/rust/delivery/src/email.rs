//! Email delivery: renders a JSON payload with subject, preheader, and
//! body. The preheader is derived from the first paragraph and capped at
//! 140 characters.

use contentforge_shared::{
    BlockKind, Channel, ContentArtifact, ContentForgeError, Destination, Result,
};

use crate::{DeliveryAdapter, RenderedDelivery};

/// Preheader length cap enforced at render time.
pub const PREHEADER_MAX_CHARS: usize = 140;

#[derive(Debug)]
pub struct EmailAdapter;

const SUPPORTED: &[(Channel, Destination)] = &[(Channel::Email, Destination::EmailList)];

impl DeliveryAdapter for EmailAdapter {
    fn name(&self) -> &'static str {
        "email"
    }

    fn supports(&self) -> &[(Channel, Destination)] {
        SUPPORTED
    }

    fn render(&self, artifact: &ContentArtifact) -> Result<RenderedDelivery> {
        let subject = artifact.title.trim();
        if subject.is_empty() {
            return Err(ContentForgeError::post_condition(
                "email subject is empty",
            ));
        }

        let preheader = truncate_chars(&first_paragraph(artifact), PREHEADER_MAX_CHARS);
        let payload = serde_json::json!({
            "subject": subject,
            "preheader": preheader,
            "body": artifact.plain_text(),
        });
        let body = serde_json::to_string_pretty(&payload)
            .map_err(|e| ContentForgeError::Storage(e.to_string()))?;

        Ok(RenderedDelivery {
            adapter: self.name(),
            file_name: format!("{}-email.json", artifact.run_id),
            body,
        })
    }
}

fn first_paragraph(artifact: &ContentArtifact) -> String {
    artifact
        .sections
        .iter()
        .flat_map(|s| s.blocks.iter())
        .find(|b| b.kind == BlockKind::Paragraph)
        .and_then(|b| b.text.clone())
        .unwrap_or_default()
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max.saturating_sub(1)).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::artifact;
    use contentforge_shared::{Block, Section};

    #[test]
    fn renders_subject_preheader_and_body() {
        let mut artifact = artifact(Channel::Email, Destination::EmailList);
        let mut section = Section::new("intro", None);
        section.blocks.push(Block::paragraph("Topic: leadership."));
        artifact.sections.push(section);

        let rendered = EmailAdapter.render(&artifact).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&rendered.body).unwrap();
        assert_eq!(payload["subject"], "On Constraints");
        assert_eq!(payload["preheader"], "Topic: leadership.");
        assert!(rendered.file_name.ends_with("-email.json"));
    }

    #[test]
    fn preheader_is_capped_at_140_chars() {
        let mut artifact = artifact(Channel::Email, Destination::EmailList);
        let mut section = Section::new("intro", None);
        section.blocks.push(Block::paragraph("x".repeat(500)));
        artifact.sections.push(section);

        let rendered = EmailAdapter.render(&artifact).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&rendered.body).unwrap();
        let preheader = payload["preheader"].as_str().unwrap();
        assert!(preheader.chars().count() <= PREHEADER_MAX_CHARS);
    }

    #[test]
    fn empty_subject_is_fatal() {
        let mut artifact = artifact(Channel::Email, Destination::EmailList);
        artifact.title = "   ".into();
        assert!(EmailAdapter.render(&artifact).is_err());
    }
}
