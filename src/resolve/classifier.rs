use url::Url;

/// Extensions of documents that wrap a stream rather than carry it.
const RESOLVABLE_EXTENSIONS: [&str; 4] = ["htm", "html", "m3u", "m3u8"];

/// Whether `url` (optionally relative to `base`) must be fetched to find
/// the real stream. Unparsable URLs are left alone.
pub fn needs_resolution(url: &str, base: Option<&Url>) -> bool {
    Url::options()
        .base_url(base)
        .parse(url)
        .map(|url| url_needs_resolution(&url))
        .unwrap_or(false)
}

pub fn url_needs_resolution(url: &Url) -> bool {
    extension(url)
        .map(|ext| {
            RESOLVABLE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

/// Extension of the last path segment, if any.
fn extension(url: &Url) -> Option<&str> {
    let segment = url.path_segments()?.next_back()?;
    segment.rsplit_once('.').map(|(_, ext)| ext)
}
