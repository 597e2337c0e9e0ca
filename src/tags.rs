use std::sync::LazyLock;

use regex::Regex;

/// A tag is a `#` followed by letters or digits, so punctuation and spaces
/// end it. Matches the pattern the notes were always written with.
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([\p{L}\p{Nd}]+)").expect("Tag pattern should compile"));

/// Pulls hashtags out of free text, deduplicated, in order of appearance.
pub fn extract_tags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = vec![];
    for captures in TAG_PATTERN.captures_iter(text) {
        let tag = &captures[1];
        if !tags.iter().any(|known| known == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Tags for a whole task, title first, notes second, deduplicated across
/// both.
pub fn extract_task_tags(title: &str, notes: &str) -> Vec<String> {
    let mut tags = extract_tags(title);
    for tag in extract_tags(notes) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}
