//! Document fetching
//!
//! This module defines the fetch collaborator the crawl depends on:
//! - `DocumentSource`: resolves a `DocumentId` to a parsed document
//! - `FetchError` / `FetchErrorKind`: the closed set of fetch failures the
//!   retry layer reacts to
//! - `WikiSource`: the HTTP implementation against a MediaWiki site
//!
//! Keeping the trait separate lets the crawl run against an in-memory source
//! in tests.

use crate::config::{SiteConfig, UserAgentConfig};
use crate::crawler::outline::HeadingEvent;
use crate::crawler::parser::parse_article;
use crate::url::{DocumentId, Link};
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Category of a fetch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The reference is ambiguous and resolves to a disambiguation page
    Disambiguation,
    /// No such document
    NotFound,
    /// A timeout or server-side error that may succeed on retry
    Transient,
    /// The connection was reset by the peer; fatal to the run
    ConnectionReset,
    /// Traversal nesting exceeded the configured bound
    RecursionLimit,
    /// The page has no usable title
    TitleMissing,
    /// The page has no main content container
    EmptyContentRoot,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disambiguation => "disambiguation",
            Self::NotFound => "not-found",
            Self::Transient => "transient",
            Self::ConnectionReset => "connection-reset",
            Self::RecursionLimit => "recursion-limit",
            Self::TitleMissing => "title-missing",
            Self::EmptyContentRoot => "empty-content-root",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified fetch failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// How strictly a reference is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Let the wiki pick the best match (search, redirects)
    Fuzzy,
    /// Take the reference literally as an article name
    Exact,
}

/// A fetched and parsed document
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Where the document actually lives after redirects
    pub resolved_url: Url,
    pub title: String,
    /// All visible body text, used for relevance scoring
    pub body_text: String,
    pub headings: Vec<HeadingEvent>,
    pub links: Vec<Link>,
}

/// Source of documents for the crawl
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetches the document named by `id`
    async fn fetch(&self, id: &DocumentId, resolution: Resolution)
        -> Result<FetchedDocument, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use wiki_outline::config::UserAgentConfig;
/// use wiki_outline::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "WikiOutline".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        // Title redirects and search hits both answer with 3xx
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `DocumentSource` backed by a MediaWiki site over HTTP
#[derive(Debug, Clone)]
pub struct WikiSource {
    client: Client,
    base: Url,
    content_root: String,
}

impl WikiSource {
    pub fn new(client: Client, site: &SiteConfig) -> Result<Self, ConfigError> {
        let base = Url::parse(&site.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;
        Ok(Self {
            client,
            base,
            content_root: site.content_root.clone(),
        })
    }

    /// Builds the request URL for `id`
    ///
    /// | Identifier | Fuzzy | Exact |
    /// |------------|-------|-------|
    /// | URL | the URL | the URL |
    /// | Title | search with "go" | `<content_root><Title_With_Underscores>` |
    pub fn request_url(&self, id: &DocumentId, resolution: Resolution) -> Url {
        match (id, resolution) {
            (DocumentId::Url(url), _) => url.clone(),
            (DocumentId::Title(title), Resolution::Fuzzy) => {
                let mut url = self.base.clone();
                url.set_path("/w/index.php");
                url.query_pairs_mut()
                    .append_pair("search", title)
                    .append_pair("title", "Special:Search")
                    .append_pair("go", "Go");
                url
            }
            (DocumentId::Title(title), Resolution::Exact) => {
                let mut url = self.base.clone();
                url.set_path(&self.content_root);
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.pop_if_empty().push(&title.replace(' ', "_"));
                }
                url
            }
        }
    }
}

#[async_trait]
impl DocumentSource for WikiSource {
    async fn fetch(
        &self,
        id: &DocumentId,
        resolution: Resolution,
    ) -> Result<FetchedDocument, FetchError> {
        let url = self.request_url(id, resolution);
        tracing::debug!("GET {} ({:?})", url, resolution);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_request_error(&e))?;

        let status = response.status();
        if let Some(kind) = classify_status(status) {
            return Err(FetchError::new(
                kind,
                format!("HTTP {} for {}", status.as_u16(), url),
            ));
        }

        let final_url = response.url().clone();
        if is_search_results(&final_url) {
            return Err(FetchError::new(
                FetchErrorKind::NotFound,
                format!("no article matches {}", id),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_request_error(&e))?;

        let article = parse_article(&body, &final_url)?;
        if article.is_disambiguation {
            return Err(FetchError::new(
                FetchErrorKind::Disambiguation,
                format!("{} is a disambiguation page", article.title),
            ));
        }

        Ok(FetchedDocument {
            resolved_url: article.canonical_url.unwrap_or(final_url),
            title: article.title,
            body_text: article.body_text,
            headings: article.headings,
            links: article.links,
        })
    }
}

/// Maps a non-success HTTP status to a fetch failure category
///
/// | Status | Kind |
/// |--------|------|
/// | 2xx | none |
/// | 404, 410 | NotFound |
/// | 408, 429, 5xx | Transient |
/// | anything else | NotFound |
pub fn classify_status(status: StatusCode) -> Option<FetchErrorKind> {
    if status.is_success() {
        return None;
    }

    Some(match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => FetchErrorKind::NotFound,
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => FetchErrorKind::Transient,
        s if s.is_server_error() => FetchErrorKind::Transient,
        _ => FetchErrorKind::NotFound,
    })
}

/// Classifies a transport error
///
/// Resets are found by walking the source chain down to the `io::Error`.
fn classify_request_error(error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::new(FetchErrorKind::Transient, "request timeout");
    }

    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ) {
                return FetchError::new(FetchErrorKind::ConnectionReset, error.to_string());
            }
        }
        source = err.source();
    }

    FetchError::new(FetchErrorKind::Transient, error.to_string())
}

/// True if a fuzzy lookup landed on the search page instead of an article
fn is_search_results(url: &Url) -> bool {
    url.path() == "/w/index.php" || url.path().contains("Special:Search")
}
