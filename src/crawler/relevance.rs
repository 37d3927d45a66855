//! Keyword relevance gate
//!
//! A document is relevant when its text contains at least `threshold`
//! distinct keywords (case-insensitive substring match). Irrelevant documents
//! are neither written nor expanded.

use crate::config::RelevanceConfig;

#[derive(Debug, Clone)]
pub struct RelevanceClassifier {
    keywords: Vec<String>,
    threshold: usize,
}

impl RelevanceClassifier {
    pub fn new(keywords: &[String], threshold: usize) -> Self {
        let mut lowered: Vec<String> = keywords.iter().map(|k| k.trim().to_lowercase()).collect();
        lowered.sort();
        lowered.dedup();

        Self {
            keywords: lowered,
            threshold,
        }
    }

    pub fn from_config(config: &RelevanceConfig) -> Self {
        Self::new(&config.keywords, config.threshold)
    }

    /// Keywords found in `text`, in sorted order
    pub fn matched_keywords<'a>(&'a self, text: &str) -> Vec<&'a str> {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|keyword| text.contains(keyword.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Returns true if at least `threshold` distinct keywords occur in `text`
    pub fn is_relevant(&self, text: &str) -> bool {
        self.matched_keywords(text).len() >= self.threshold
    }

    /// Returns true if any keyword occurs in `text`
    pub fn mentions_any(&self, text: &str) -> bool {
        !self.matched_keywords(text).is_empty()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}
