use crate::model::SourceLocator;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Resolves a playlist path against the media base URL.
///
/// Absolute URLs pass through untouched; relative paths are joined segment by
/// segment with percent-encoding. A blank path yields the empty locator.
pub fn resolve_locator(base: &Url, path: &str) -> Result<SourceLocator, url::ParseError> {
    let path = path.trim();
    if path.is_empty() {
        return Ok(SourceLocator::empty());
    }
    if let Ok(absolute) = Url::parse(path) {
        return Ok(SourceLocator::new(absolute.to_string()));
    }

    let mut dir = base.clone();
    if !dir.path().ends_with('/') {
        let with_slash = format!("{}/", dir.path());
        dir.set_path(&with_slash);
    }

    let encoded = path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");

    Ok(SourceLocator::new(dir.join(&encoded)?.to_string()))
}

#[cfg(test)]
mod tests {
    use super::resolve_locator;
    use url::Url;

    fn base() -> Url {
        Url::parse("https://cdn.example.com/media").unwrap()
    }

    #[test]
    fn encodes_relative_segments() {
        let loc = resolve_locator(&base(), "Daft Punk/One More Time.mp3").unwrap();
        assert_eq!(
            loc.as_str(),
            "https://cdn.example.com/media/Daft%20Punk/One%20More%20Time.mp3"
        );
    }

    #[test]
    fn keeps_absolute_urls() {
        let loc = resolve_locator(&base(), "https://other.example.org/a.mp3").unwrap();
        assert_eq!(loc.as_str(), "https://other.example.org/a.mp3");
    }

    #[test]
    fn blank_path_is_empty_locator() {
        assert!(resolve_locator(&base(), "   ").unwrap().is_empty());
    }

    #[test]
    fn leading_slash_stays_under_base() {
        let loc = resolve_locator(&base(), "/AC/DC.mp3").unwrap();
        assert_eq!(loc.as_str(), "https://cdn.example.com/media/AC/DC.mp3");
    }
}
