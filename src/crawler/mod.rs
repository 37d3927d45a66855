//! Crawler module for document fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The document source abstraction and its HTTP implementation
//! - HTML parsing into heading/text streams and links
//! - Retry policy around fetches
//! - Relevance gating and outline extraction
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod outline;
mod parser;
mod relevance;
mod retry;

pub use coordinator::{run_crawl, Coordinator, Exploration, RunOptions};
pub use fetcher::{
    build_http_client, classify_status, DocumentSource, FetchError, FetchErrorKind,
    FetchedDocument, Resolution, WikiSource,
};
pub use outline::{
    extract_outline, HeadingEvent, OutlineExtractor, OutlineRecord, BREADCRUMB_SEPARATOR,
    MAX_HEADING_LEVEL, MIN_HEADING_LEVEL,
};
pub use parser::{parse_article, ParsedArticle};
pub use relevance::RelevanceClassifier;
pub use retry::{fetch_with_retry, FetchOutcome, RetryAction, RetryPolicy, RetryState};
