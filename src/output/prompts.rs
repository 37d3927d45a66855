//! Topic prompt builder
//!
//! Reads written articles back and turns each qualifying outline line into a
//! topic-generation prompt for a downstream language model. Sending the
//! prompts is left to the caller.

use crate::config::PromptConfig;
use crate::crawler::{RelevanceClassifier, BREADCRUMB_SEPARATOR};
use crate::output::article::ARTICLE_EXTENSION;
use crate::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// One prompt derived from one article line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicPrompt {
    /// Article file name
    pub file: String,
    /// Zero-based line number within the file
    pub line: usize,
    pub system: String,
    pub prompt: String,
}

/// Builds prompts for every article in `articles_dir`, in file name order
///
/// A line qualifies when its text mentions any keyword, or when the file
/// name itself does.
pub fn build_prompts(
    articles_dir: &Path,
    classifier: &RelevanceClassifier,
    config: &PromptConfig,
) -> Result<Vec<TopicPrompt>> {
    let mut files: Vec<_> = fs::read_dir(articles_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext == ARTICLE_EXTENSION)
        })
        .collect();
    files.sort();

    let mut prompts = Vec::new();
    for path in files {
        let Some(file) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let content = fs::read_to_string(&path)?;
        prompts.extend(prompts_for_article(&file, &content, classifier, config));
    }

    tracing::debug!("Built {} prompts from {}", prompts.len(), articles_dir.display());
    Ok(prompts)
}

/// Builds prompts for one article's content
pub fn prompts_for_article(
    file: &str,
    content: &str,
    classifier: &RelevanceClassifier,
    config: &PromptConfig,
) -> Vec<TopicPrompt> {
    let file_on_topic = classifier.mentions_any(file);
    let mut title = file
        .strip_suffix(&format!(".{}", ARTICLE_EXTENSION))
        .unwrap_or(file)
        .replace('_', " ");

    let mut prompts = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let (breadcrumb, body) = line.split_once('\t').unwrap_or((line, ""));
        if line_num == 0 {
            title = breadcrumb.to_string();
        }

        if !(file_on_topic || classifier.mentions_any(line)) {
            continue;
        }

        prompts.push(TopicPrompt {
            file: file.to_string(),
            line: line_num,
            system: config.system.clone(),
            prompt: format_prompt(&config.subject, &title, breadcrumb, body, line_num == 0),
        });
    }
    prompts
}

fn format_prompt(subject: &str, title: &str, breadcrumb: &str, body: &str, first: bool) -> String {
    let mut prompt = format!("Generate {} topics under {}", subject, title);

    if !first {
        let segments: Vec<&str> = breadcrumb.split(BREADCRUMB_SEPARATOR).collect();
        let last = segments.len() - 1;
        for (i, segment) in segments.iter().enumerate() {
            if i == last {
                prompt.push_str(&format!(", specifically related to {}", segment));
            } else {
                prompt.push_str(&format!(" under {}", segment));
            }
        }
    }

    if !body.is_empty() {
        prompt.push_str(&format!(" given this short description: {}", body));
    }
    prompt
}
