//! Text normalization shared by every encoder
//!
//! All strategies and the reference extraction go through these helpers so
//! that vocabulary lookups see identically normalized words.

use crate::config::LinkHandling;

/// Characters removed before tokenization. `-`, `/` and `_` survive.
pub const PUNCTUATION: &str = "!\"#$%&'()*+,.:;<=>?@[\\]^`{|}~";

/// Literal marker that prefixes a linked entity inside an abstract
pub const LINK_MARKER: &str = "resource/";

/// Strip punctuation and lowercase
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !PUNCTUATION.contains(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalize then split on whitespace
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Tokens of an entity label, with underscores read as spaces
///
/// `New_York_City` becomes `["new", "york", "city"]`.
pub fn title_tokens(label: &str) -> Vec<String> {
    normalize(label)
        .replace('_', " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Tokens fed to the sequential encoder
///
/// Markers are removed after normalization, so `Resource/Foo` reads as `foo`
/// and the linked entity name stays inline.
pub fn sequence_tokens(text: &str) -> Vec<String> {
    normalize(text)
        .replace(LINK_MARKER, "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Tokens fed to the description encoders (mean and distance)
pub fn description_tokens(text: &str, links: LinkHandling) -> Vec<String> {
    let tokens = tokenize(text);
    match links {
        LinkHandling::Literal => tokens,
        LinkHandling::Drop => tokens
            .into_iter()
            .filter(|t| !t.starts_with(LINK_MARKER))
            .collect(),
    }
}

/// A `resource/` marker not followed by any token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedLink {
    /// Zero-based position of the offending marker
    pub position: usize,
}

/// Normalized names of the entities an abstract links to, in order
///
/// Text before the first marker is ignored. Each marker contributes the first
/// whitespace-delimited token after it.
pub fn link_targets(text: &str) -> Result<Vec<String>, MalformedLink> {
    text.split(LINK_MARKER)
        .skip(1)
        .enumerate()
        .map(|(position, fragment)| {
            fragment
                .split_whitespace()
                .next()
                .map(normalize)
                .ok_or(MalformedLink { position })
        })
        .collect()
}
