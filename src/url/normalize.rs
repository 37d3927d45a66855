use crate::UrlError;
use url::Url;

/// Query parameters that never change which document a URL names
const TRACKING_PARAMS: &[&str] = &["utm_source", "utm_medium", "utm_campaign", "fbclid", "gclid"];

/// Normalizes an absolute URL so equivalent references compare equal
///
/// # Normalization Steps
///
/// 1. Reject non-HTTP(S) schemes
/// 2. Normalize path:
///    - Remove dot segments (. and ..)
///    - Collapse repeated slashes
///    - Remove trailing slash (except for root /)
/// 3. Remove fragment (everything after #)
/// 4. Remove tracking query parameters and sort the rest
///
/// The host is already lowercased by the `url` parser. Applying this function
/// to its own output returns the same URL.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wiki_outline::url::normalize_url;
///
/// let url = normalize_url(Url::parse("https://en.wikipedia.org/wiki/Tort/#History").unwrap()).unwrap();
/// assert_eq!(url.as_str(), "https://en.wikipedia.org/wiki/Tort");
/// ```
pub fn normalize_url(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()) && !key.starts_with("utm_"))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

/// Normalizes a wiki title: underscores become spaces, whitespace collapses,
/// any `#section` suffix is dropped and the first letter is uppercased
///
/// Returns `None` when nothing is left (e.g. a bare `#anchor`).
pub fn normalize_title(raw: &str) -> Option<String> {
    let without_fragment = raw.split('#').next().unwrap_or_default();
    let spaced = without_fragment.replace('_', " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut chars = collapsed.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}
