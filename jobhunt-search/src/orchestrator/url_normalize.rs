//! Canonical listing URLs.
//!
//! The same posting reaches us with different tracking decorations
//! depending on which page or feed surfaced it. Canonicalising before
//! deduplication makes those compare equal.

use url::Url;

/// Query parameters that carry click tracking rather than identity.
/// Compared case-insensitively; any `utm_*` key is also dropped.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid",
    "gclid",
    "ref",
    "refid",
    "trk",
    "trkinfo",
    "trackingid",
    "position",
    "pagenum",
    "from",
    "vjs",
];

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Canonical form of a listing URL used as the deduplication key.
///
/// - scheme and host lowercased, default ports dropped
/// - fragment removed
/// - tracking parameters removed, the rest sorted by key then value
/// - trailing slash removed from non-root paths
///
/// Input that does not parse as a URL is only trimmed.
///
/// ```
/// use jobhunt_search::orchestrator::url_normalize::normalize_url;
///
/// let a = normalize_url("https://WWW.LinkedIn.com/jobs/view/42/?trk=public_jobs&refId=x");
/// let b = normalize_url("https://www.linkedin.com/jobs/view/42");
/// assert_eq!(a, b);
/// ```
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };

    url.set_fragment(None);

    if matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    ) {
        let _ = url.set_port(None);
    }

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    if params.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(params);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}
