//! End-of-run summary
//!
//! Every run, completed or aborted, ends with a `run_summary.md` in the
//! output directory describing what happened.

use crate::Result;
use chrono::{DateTime, Local};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// File name of the markdown run summary
pub const SUMMARY_FILE: &str = "run_summary.md";

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// Stopped early by a fatal fetch failure
    Aborted(String),
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Aborted(reason) => write!(f, "aborted ({})", reason),
        }
    }
}

/// Per-run document counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Documents fetched successfully
    pub explored: u64,
    /// Documents written as articles
    pub written: u64,
    /// Documents rejected by the relevance gate
    pub rejected: u64,
    /// Documents skipped because their identity had already been processed
    pub duplicates: u64,
    /// Documents skipped for a missing title or content container
    pub malformed: u64,
    /// Branches abandoned at the recursion bound
    pub unwound: u64,
    /// Relevant documents whose article could not be written
    pub write_failed: u64,
}

/// Data for the end-of-run report
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub traversal: String,
    pub config_hash: String,
    pub status: RunStatus,
    pub stats: CrawlStats,
    pub failures: u64,
    pub visited_urls: usize,
    pub visited_titles: usize,
}

impl CrawlSummary {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds().max(0)
    }

    /// Percentage of explored documents that passed the relevance gate
    pub fn acceptance_rate(&self) -> f64 {
        if self.stats.explored == 0 {
            0.0
        } else {
            (self.stats.written as f64 / self.stats.explored as f64) * 100.0
        }
    }

    /// One-line form for the log
    pub fn log_line(&self) -> String {
        format!(
            "Run {} in {}s: {} explored, {} written, {} rejected, {} duplicates, {} malformed, {} unwound, {} write failures, {} failures",
            self.status,
            self.duration_seconds(),
            self.stats.explored,
            self.stats.written,
            self.stats.rejected,
            self.stats.duplicates,
            self.stats.malformed,
            self.stats.unwound,
            self.stats.write_failed,
            self.failures
        )
    }
}

/// Writes the markdown summary to `output_path`
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> Result<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Wiki-Outline Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **Started**: {}\n",
        summary.started_at.to_rfc3339()
    ));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        summary.finished_at.to_rfc3339()
    ));
    let duration = summary.duration_seconds();
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        duration,
        duration as f64 / 60.0
    ));
    md.push_str(&format!("- **Traversal**: {}\n", summary.traversal));
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Document outcomes
    md.push_str("## Documents\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Explored | {} |\n", summary.stats.explored));
    md.push_str(&format!("| Written | {} |\n", summary.stats.written));
    md.push_str(&format!(
        "| Rejected (irrelevant) | {} |\n",
        summary.stats.rejected
    ));
    md.push_str(&format!(
        "| Skipped (duplicate) | {} |\n",
        summary.stats.duplicates
    ));
    md.push_str(&format!(
        "| Skipped (malformed) | {} |\n",
        summary.stats.malformed
    ));
    md.push_str(&format!(
        "| Unwound (recursion limit) | {} |\n",
        summary.stats.unwound
    ));
    md.push_str(&format!(
        "| Not written (I/O error) | {} |\n",
        summary.stats.write_failed
    ));
    md.push_str(&format!("| Failed | {} |\n\n", summary.failures));
    md.push_str(&format!(
        "- **Acceptance Rate**: {:.2}%\n\n",
        summary.acceptance_rate()
    ));

    // Registry
    md.push_str("## Visited Registry\n\n");
    md.push_str(&format!("- **URLs**: {}\n", summary.visited_urls));
    md.push_str(&format!("- **Titles**: {}\n", summary.visited_titles));

    md
}
