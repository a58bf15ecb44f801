//! Blog delivery: renders the artifact as Markdown.
//!
//! Serves hosted and client-website blog destinations with the same
//! rendering.

use contentforge_shared::{
    Block, BlockKind, Channel, ContentArtifact, Destination, Result, Section,
};

use crate::{DeliveryAdapter, RenderedDelivery};

#[derive(Debug)]
pub struct BlogAdapter;

const SUPPORTED: &[(Channel, Destination)] = &[
    (Channel::BlogArticle, Destination::HostedByUs),
    (Channel::BlogArticle, Destination::ClientWebsite),
];

impl DeliveryAdapter for BlogAdapter {
    fn name(&self) -> &'static str {
        "blog"
    }

    fn supports(&self) -> &[(Channel, Destination)] {
        SUPPORTED
    }

    fn render(&self, artifact: &ContentArtifact) -> Result<RenderedDelivery> {
        let mut out = format!("# {}\n", artifact.title);
        for section in &artifact.sections {
            out.push('\n');
            out.push_str(&render_section(section));
        }

        Ok(RenderedDelivery {
            adapter: self.name(),
            file_name: format!("{}-blog.md", artifact.run_id),
            body: out,
        })
    }
}

fn render_section(section: &Section) -> String {
    let mut out = String::new();
    if let Some(heading) = &section.heading {
        out.push_str(&format!("## {heading}\n\n"));
    }
    for block in &section.blocks {
        out.push_str(&render_block(block));
        out.push('\n');
    }
    out
}

fn render_block(block: &Block) -> String {
    match block.kind {
        BlockKind::Paragraph => format!("{}\n", block.text.as_deref().unwrap_or_default()),
        BlockKind::Callout | BlockKind::Quote => {
            format!("> {}\n", block.text.as_deref().unwrap_or_default())
        }
        BlockKind::Bullets => {
            let mut out = String::new();
            for item in &block.items {
                out.push_str(&format!("- {item}\n"));
            }
            out
        }
        BlockKind::Numbered => {
            let mut out = String::new();
            for (i, item) in block.items.iter().enumerate() {
                out.push_str(&format!("{}. {item}\n", i + 1));
            }
            out
        }
        BlockKind::Divider => "---\n".into(),
    }
}
