//! Ingress-level URL validation and diagnostic trimming.

use thiserror::Error;

/// Maximum characters kept from an external tool's diagnostic output.
const MAX_EXCERPT_CHARS: usize = 1000;

/// Rejected source URL. Never becomes a job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidUrl {
    #[error("missing url")]
    Missing,

    #[error("url must start with http:// or https://")]
    UnsupportedScheme,
}

/// Validates a candidate source URL and returns it trimmed.
///
/// Only the scheme prefix is checked, case-sensitively; anything past it is
/// handed to the fetcher verbatim.
pub fn validate_source_url(candidate: &str) -> Result<String, InvalidUrl> {
    let url = candidate.trim();
    if url.is_empty() {
        return Err(InvalidUrl::Missing);
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(InvalidUrl::UnsupportedScheme)
    }
}

/// Returns the last `max_lines` non-empty lines of `output`.
///
/// The result is also capped in characters so a single giant line cannot
/// blow up a chat message.
pub fn diagnostic_excerpt(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();

    let start = lines.len().saturating_sub(max_lines);
    let excerpt = lines[start..].join("\n");

    if excerpt.chars().count() <= MAX_EXCERPT_CHARS {
        return excerpt;
    }

    let skip = excerpt.chars().count() - MAX_EXCERPT_CHARS;
    format!("…{}", excerpt.chars().skip(skip).collect::<String>())
}
