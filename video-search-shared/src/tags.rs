//! Hashtag extraction and tag unification.
//!
//! The tag set of a video is the union of the hashtags found in its title and
//! description with any explicitly supplied tags. Derivation is pure and idempotent.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    static ref HASHTAG_REGEXP: Regex = Regex::new(r"^#(\w+)$").unwrap();
}

/// Returns the hashtags found in `text`, without the leading `#`, in order of appearance.
///
/// A hashtag is a whitespace-delimited token made of `#` followed by one or more
/// word characters.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|token| HASHTAG_REGEXP.captures(token))
        .filter_map(|captures| captures.get(1))
        .map(|tag| tag.as_str().to_string())
        .collect()
}

/// Normalizes a caller supplied tag: trims it and strips one leading `#`.
///
/// Returns `None` when nothing is left.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    let stripped = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}

/// Normalizes a list of tags, dropping empty entries and duplicates.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> BTreeSet<String> {
    tags.iter()
        .filter_map(|tag| normalize_tag(tag.as_ref()))
        .collect()
}

/// Computes the tag set of a video.
pub fn derive_tags(
    title: &str,
    description: &str,
    explicit_tags: Option<&[String]>,
) -> BTreeSet<String> {
    let mut tags: BTreeSet<String> = extract_hashtags(title).into_iter().collect();
    tags.extend(extract_hashtags(description));
    if let Some(explicit) = explicit_tags {
        tags.extend(normalize_tags(explicit));
    }
    tags
}
