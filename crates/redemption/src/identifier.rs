// Rust guideline compliant 2026-10-12

//! Identifier extraction from raw scanner payloads.
//!
//! QR codes carry either a bare promotion id or a link such as
//! `https://host/c?id=<id>` or `https://host/c/<id>`.

use url::Url;

/// Turn a raw scanned string into a promotion identifier.
///
/// Trims the input; an empty result means "no identifier". When the trimmed
/// text parses as an absolute URL the `id` query parameter wins, then the last
/// non-empty path segment, then the whole trimmed text. Anything that does not
/// parse as a URL is returned trimmed but otherwise unchanged.
#[must_use]
pub fn extract_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let Ok(url) = Url::parse(trimmed) else {
        return trimmed.to_owned();
    };

    // First `id` pair only; an empty value falls through to the path.
    if let Some(id) = url
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
    {
        return id.into_owned();
    }

    url.path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map_or_else(|| trimmed.to_owned(), str::to_owned)
}

/// Reduce an identifier to the characters a promotion key may contain.
///
/// Keeps ASCII letters, digits and `-`; everything else is dropped.
#[must_use]
pub fn canonical_key(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}
