//! URL handling module for Wiki-Outline
//!
//! This module turns raw references (hrefs, seed titles, redirect targets)
//! into canonical [`DocumentId`]s and decides which outgoing links are worth
//! following.

mod filter;
mod normalize;

use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

pub use filter::{Link, LinkFilter};
pub use normalize::{normalize_title, normalize_url};

/// Canonical identifier of one crawlable document
///
/// Values are only built through [`canonicalize`] (or the registry snapshot
/// loader), so derived equality is equality of canonical forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentId {
    /// A normalized absolute URL
    Url(Url),
    /// A normalized article title
    Title(String),
}

impl DocumentId {
    /// Builds a title identifier, normalizing the raw text
    pub fn title(raw: &str) -> UrlResult<Self> {
        normalize_title(raw).map(Self::Title).ok_or(UrlError::Empty)
    }

    /// Returns the URL form, if this identifier is one
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Self::Url(url) => Some(url),
            Self::Title(_) => None,
        }
    }

    /// Derives the article title this identifier names
    ///
    /// Titles return themselves. URLs return the decoded path below
    /// `content_root` (`/wiki/Due_process` → `Due process`), or `None` when the
    /// URL is not a plain article path.
    pub fn title_hint(&self, content_root: &str) -> Option<String> {
        match self {
            Self::Title(title) => Some(title.clone()),
            Self::Url(url) => {
                if url.query().is_some() {
                    return None;
                }
                let rest = url.path().strip_prefix(content_root)?;
                let decoded = urlencoding::decode(rest).ok()?;
                normalize_title(&decoded)
            }
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{}", url),
            Self::Title(title) => write!(f, "{}", title),
        }
    }
}

/// Canonicalizes a raw document reference
///
/// References that look like paths or absolute URLs (`https://…`, `/wiki/…`,
/// `./…`) are resolved against `base` and normalized; everything else is
/// treated as an article title. The function is idempotent:
/// `canonicalize(&canonicalize(x)?.to_string())? == canonicalize(x)?`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wiki_outline::url::{canonicalize, DocumentId};
///
/// let base = Url::parse("https://en.wikipedia.org").unwrap();
/// let id = canonicalize("/wiki/Tort#History", &base).unwrap();
/// assert_eq!(id.to_string(), "https://en.wikipedia.org/wiki/Tort");
///
/// let title = canonicalize("contract_law", &base).unwrap();
/// assert_eq!(title, DocumentId::Title("Contract law".to_string()));
/// ```
pub fn canonicalize(reference: &str, base: &Url) -> UrlResult<DocumentId> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(UrlError::Empty);
    }

    if looks_like_url(reference) {
        let joined = base
            .join(reference)
            .map_err(|e| UrlError::Parse(format!("{}: {}", reference, e)))?;
        return normalize_url(joined).map(DocumentId::Url);
    }

    DocumentId::title(reference)
}

fn looks_like_url(reference: &str) -> bool {
    reference.contains("://")
        || reference.starts_with('/')
        || reference.starts_with("./")
        || reference.starts_with("../")
}
