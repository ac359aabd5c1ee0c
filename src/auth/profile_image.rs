//! Profile image normalization.
//!
//! Profile images arrive as URLs, data URIs, or bare base64 blobs depending on
//! the sign-in flavour. Normalizing turns them into something a renderer can
//! use directly.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Bare base64 shorter than this is treated as plain text, not image data.
const MIN_BASE64_LEN: usize = 16;

fn is_likely_base64(value: &str) -> bool {
    value.len() >= MIN_BASE64_LEN && value.len() % 4 == 0 && STANDARD.decode(value).is_ok()
}

fn has_renderable_scheme(value: &str) -> bool {
    let lower = value.get(..11).unwrap_or(value).to_ascii_lowercase();
    ["data:image/", "http://", "https://", "blob:"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Normalize one profile image value.
///
/// URLs and data URIs pass through trimmed; bare base64 becomes a JPEG data
/// URI; blank input becomes `None`.
#[must_use]
pub fn normalize_profile_image(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    if has_renderable_scheme(trimmed) {
        return Some(trimmed.to_owned());
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if is_likely_base64(&compact) {
        return Some(format!("data:image/jpeg;base64,{compact}"));
    }
    Some(trimmed.to_owned())
}

/// First source that normalizes to a usable image.
#[must_use]
pub fn resolve_profile_image<'a, I>(sources: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    sources.into_iter().find_map(normalize_profile_image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_and_data_uris_pass_through() {
        for value in [
            "https://cdn.example.com/a.png",
            "HTTP://example.com/b.jpg",
            "data:image/png;base64,AAAA",
            "blob:http://localhost/123",
        ] {
            assert_eq!(normalize_profile_image(Some(value)).as_deref(), Some(value));
        }
    }

    #[test]
    fn bare_base64_becomes_data_uri() {
        let raw = "iVBORw0KGgoAAAANSUhEUgAA\nAAEAAAABCAYAAAAfFcSJ";
        let normalized = normalize_profile_image(Some(raw)).unwrap();
        assert_eq!(
            normalized,
            "data:image/jpeg;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJ"
        );
    }

    #[test]
    fn short_or_odd_values_are_kept_as_text() {
        assert_eq!(normalize_profile_image(Some(" abcd ")).as_deref(), Some("abcd"));
        assert_eq!(
            normalize_profile_image(Some("avatars/user-1.png")).as_deref(),
            Some("avatars/user-1.png")
        );
    }

    #[test]
    fn blank_is_none() {
        assert_eq!(normalize_profile_image(None), None);
        assert_eq!(normalize_profile_image(Some("   ")), None);
    }

    #[test]
    fn resolve_picks_first_usable() {
        let picked = resolve_profile_image([None, Some("  "), Some("https://x/y.png"), Some("z")]);
        assert_eq!(picked.as_deref(), Some("https://x/y.png"));
        assert_eq!(resolve_profile_image([None, None]), None);
    }
}
