//! Canonical forms for free-form strings: keys, URLs, ingredient text.

use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PipelineError;

/// First `https://`, `http://` or `www.` run up to whitespace or a quote
static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:https?://|www\.)[^\s<>"']+"#).expect("Valid regex pattern")
});

/// Lowercase, trim, and join words with underscores: `"Tree-Nuts "` -> `"tree_nuts"`
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Lowercase and collapse internal whitespace
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Decode HTML entities and collapse whitespace, keeping case
pub fn clean_line(raw: &str) -> String {
    // some sites double-encode entities
    let decoded = decode_html_entities(&decode_html_entities(raw)).into_owned();
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Prefix `https://` when the URL has no scheme. Blank input is rejected.
pub fn normalize_url(raw: &str) -> Result<String, PipelineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::InvalidInput("URL cannot be blank".to_string()));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(PipelineError::InvalidInput(format!(
            "URL contains whitespace: {trimmed}"
        )));
    }

    let lower = trimmed.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(trimmed.to_string())
    } else if lower.contains("://") {
        Err(PipelineError::InvalidInput(format!(
            "Unsupported URL scheme: {trimmed}"
        )))
    } else {
        Ok(format!("https://{trimmed}"))
    }
}

/// First URL in `text` by position, with trailing sentence punctuation removed
pub fn find_first_url(text: &str) -> Option<String> {
    URL_REGEX.find(text).map(|m| {
        m.as_str()
            .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | ')'))
            .to_string()
    })
}

/// Case-insensitive substring test
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    !needle.is_empty() && haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive match of `needle` as a whole word (or phrase) in `haystack`.
/// A trailing plural `s`/`es` on the match is accepted.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    let haystack = haystack.to_lowercase();
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }

    let is_word_char = |c: char| c.is_alphanumeric();
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(&needle) {
        let begin = start + pos;
        let end = begin + needle.len();

        let boundary_before = haystack[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));

        let rest = &haystack[end..];
        let rest = rest
            .strip_prefix("es")
            .filter(|r| r.chars().next().map_or(true, |c| !is_word_char(c)))
            .or_else(|| rest.strip_prefix('s'))
            .unwrap_or(rest);
        let boundary_after = rest.chars().next().map_or(true, |c| !is_word_char(c));

        if boundary_before && boundary_after {
            return true;
        }
        start = begin + needle.len().max(1);
        while !haystack.is_char_boundary(start) {
            start += 1;
        }
    }
    false
}
