//! Mention extraction — turns `@type/identifier` tokens into positioned
//! [`DocumentReference`]s.
//!
//! Only the four structured kinds (`knowledge`, `agent`, `skill`, `tool`) are
//! extracted. Other prefixes such as `@seamstress/...` are left to the mention
//! suggestion layer. Identifiers may contain word characters, `-` and `/`.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{DocumentReference, ReferenceType, Span};

/// Characters of surrounding text kept on each side of a match.
pub const CONTEXT_RADIUS: usize = 50;

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(knowledge|agent|skill|tool)/([A-Za-z0-9_\-/]+)")
        .expect("mention pattern is a valid regex")
});

/// Scan `content` left to right for non-overlapping mentions.
///
/// Positions are byte offsets of the full match (`@` through the last
/// identifier character). Each reference gets a fresh id, so only
/// type/identifier/position are stable across runs.
pub fn extract_references(content: &str) -> Vec<DocumentReference> {
    MENTION_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let ref_type = ReferenceType::parse(caps.get(1)?.as_str())?;
            let entity_id = caps.get(2)?.as_str().to_string();
            Some(DocumentReference {
                id: uuid::Uuid::new_v4().to_string(),
                ref_type,
                entity_name: entity_id.clone(),
                entity_id,
                position: Span {
                    start: whole.start(),
                    end: whole.end(),
                },
                context: context_window(content, whole.start(), whole.end(), CONTEXT_RADIUS),
            })
        })
        .collect()
}

/// `radius` characters before `start` through `radius` characters after `end`,
/// clipped to the content bounds.
fn context_window(content: &str, start: usize, end: usize, radius: usize) -> String {
    let from = content[..start]
        .char_indices()
        .rev()
        .nth(radius.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let from = if radius == 0 { start } else { from };
    let to = content[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(content.len());
    content[from..to].to_string()
}
