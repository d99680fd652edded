//! Utility functions and helpers.

pub mod http;

/// Lowercase a location string and join its words with hyphens.
///
/// Used to build Zillow-style address slugs ("123 Main St, Troy" →
/// "123-main-st,-troy", matching the upstream deep-link format).
pub fn slugify_location(location: &str) -> String {
    location.replace(' ', "-").to_lowercase()
}

/// Extract the leading token of a URL's last path segment, up to the
/// first underscore.
///
/// Listing photo URLs embed a ZPID-like identifier this way
/// (`.../12345678_p.jpg` → `12345678`). Extraction is best-effort; an
/// empty segment yields `None`.
pub fn photo_link_id(photo_link: &str) -> Option<String> {
    let segment = photo_link.rsplit('/').next()?;
    let id = segment.split('_').next().unwrap_or(segment);
    if id.is_empty() { None } else { Some(id.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_location() {
        assert_eq!(slugify_location("123 Main St Troy"), "123-main-st-troy");
        assert_eq!(slugify_location(""), "");
    }

    #[test]
    fn test_photo_link_id() {
        assert_eq!(
            photo_link_id("https://photos.zillowstatic.com/fp/29812345_p.jpg"),
            Some("29812345".to_string())
        );
        // No underscore: the whole segment is the best-effort token.
        assert_eq!(
            photo_link_id("https://example.com/photos/plain.jpg"),
            Some("plain.jpg".to_string())
        );
        assert_eq!(photo_link_id(""), None);
        assert_eq!(photo_link_id("https://example.com/dir/"), None);
    }
}
