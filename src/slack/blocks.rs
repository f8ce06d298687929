//! Slack Block Kit builders for bot replies.

use slack_morphism::prelude::{SlackBlock, SlackBlockText, SlackSectionBlock};

/// Slack rejects section text longer than this.
pub const SECTION_TEXT_LIMIT: usize = 3000;

/// Build a single markdown section block.
#[must_use]
pub fn text_section(text: &str) -> SlackBlock {
    SlackBlock::Section(
        SlackSectionBlock::new().with_text(SlackBlockText::MarkDown(text.into())),
    )
}

/// Split `text` into markdown sections that each fit Slack's limit,
/// breaking on line boundaries where possible.
#[must_use]
pub fn markdown_sections(text: &str) -> Vec<SlackBlock> {
    chunk_lines(text, SECTION_TEXT_LIMIT)
        .iter()
        .map(|chunk| text_section(chunk))
        .collect()
}

fn chunk_lines(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let mut line = line;
        // A single oversized line is hard-split on char boundaries.
        while line.chars().count() > limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let split_at = line
                .char_indices()
                .nth(limit)
                .map_or(line.len(), |(idx, _)| idx);
            chunks.push(line[..split_at].to_owned());
            line = &line[split_at..];
        }

        let needed = if current.is_empty() {
            line.chars().count()
        } else {
            current.chars().count() + 1 + line.chars().count()
        };
        if needed > limit {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}
