//! Output module for everything a crawl leaves on disk
//!
//! This module handles:
//! - Writing accepted documents as tab-delimited outline files
//! - Generating the markdown run summary
//! - Building downstream topic prompts from written articles

mod article;
mod prompts;
mod summary;

pub use article::{sanitize_title, ArticleWriter, ARTICLE_EXTENSION, MAX_FILE_NAME_BYTES};
pub use prompts::{build_prompts, prompts_for_article, TopicPrompt};
pub use summary::{
    format_markdown_summary, generate_markdown_summary, CrawlStats, CrawlSummary, RunStatus,
    SUMMARY_FILE,
};
