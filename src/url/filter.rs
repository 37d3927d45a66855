//! Outgoing link classification
//!
//! A link is traversable only if it names another article on the same wiki.
//! Edit affordances, in-page anchors, namespace pages (files, categories,
//! talk pages, …), media assets and off-site links are all excluded.

use crate::config::SiteConfig;
use crate::url::{canonicalize, DocumentId};
use crate::ConfigError;
use url::Url;

/// File extensions of assets that are never articles
const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "tif", "tiff", "bmp", "ico", "js", "css",
    "mp3", "ogg", "oga", "wav", "flac", "mid", "midi", "mp4", "webm", "ogv", "mov", "avi",
    "pdf",
];

/// Link labels that mark an edit affordance or maintenance prompt
const AFFORDANCE_LABELS: &[&str] = &["edit", "edit section", "edit source", "[edit]"];

/// One outgoing reference found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Raw `href` attribute, if any
    pub href: Option<String>,
    /// Visible link text
    pub label: String,
}

impl Link {
    pub fn new(href: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            label: label.into(),
        }
    }
}

/// Decides which outgoing links lead to further articles
#[derive(Debug, Clone)]
pub struct LinkFilter {
    base: Url,
    content_root: String,
    reserved_namespaces: Vec<String>,
}

impl LinkFilter {
    pub fn new(
        base: Url,
        content_root: impl Into<String>,
        reserved_namespaces: Vec<String>,
    ) -> Self {
        Self {
            base,
            content_root: content_root.into(),
            reserved_namespaces: reserved_namespaces
                .into_iter()
                .map(|ns| ns.to_lowercase())
                .collect(),
        }
    }

    /// Builds a filter from the `[site]` configuration section
    pub fn from_config(site: &SiteConfig) -> Result<Self, ConfigError> {
        let base = Url::parse(&site.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;
        Ok(Self::new(
            base,
            site.content_root.clone(),
            site.reserved_namespaces.clone(),
        ))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Returns true if the link names another article worth exploring
    pub fn is_traversable(&self, link: &Link) -> bool {
        self.resolve(link).is_some()
    }

    /// Canonicalizes a traversable link, or returns `None` if it is excluded
    pub fn resolve(&self, link: &Link) -> Option<DocumentId> {
        let href = link.href.as_deref().map(str::trim).filter(|h| !h.is_empty())?;

        if href.starts_with('#') || is_affordance(&link.label, href) {
            return None;
        }

        let joined = self.base.join(href).ok()?;
        if joined.host_str() != self.base.host_str() {
            return None;
        }

        let id = canonicalize(joined.as_str(), &self.base).ok()?;
        let url = id.as_url()?;

        if url.query().is_some() {
            return None;
        }

        let article = url.path().strip_prefix(&self.content_root)?;
        if article.is_empty() || self.is_namespaced(article) || has_asset_extension(article) {
            return None;
        }

        Some(id)
    }

    /// True if the first segment after the content root is a namespace page
    ///
    /// Any namespace separator in that segment excludes the link. A reserved
    /// namespace name used as a directory (`/wiki/File/…`) is excluded too.
    fn is_namespaced(&self, article_path: &str) -> bool {
        let mut segments = article_path.split('/');
        let first_segment = segments.next().unwrap_or_default();
        let decoded = urlencoding::decode(first_segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| first_segment.to_string());

        if decoded.contains(':') {
            return true;
        }

        let has_more_segments = segments.next().is_some();
        has_more_segments && self.reserved_namespaces.contains(&decoded.to_lowercase())
    }
}

fn is_affordance(label: &str, href: &str) -> bool {
    let label = label.trim().to_lowercase();
    if AFFORDANCE_LABELS.contains(&label.as_str()) || label.contains("improve this article") {
        return true;
    }

    href.contains("action=edit") || href.contains("veaction=edit")
}

fn has_asset_extension(article_path: &str) -> bool {
    let last_segment = article_path.rsplit('/').next().unwrap_or_default();
    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            ASSET_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        }
        _ => false,
    }
}
