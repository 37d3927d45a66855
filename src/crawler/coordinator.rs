//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives a whole crawl run:
//! - Seeding from configured titles or URLs (optionally resuming from snapshots)
//! - Exploring one document: dedup, fetch with retry, relevance gate,
//!   outline extraction, article writing and neighbor resolution
//! - Depth-first (recursive) or breadth-first (FIFO, optional level cap)
//!   traversal over those same steps
//! - Writing registry snapshots and the run summary however the run ends

use crate::config::{Config, Traversal};
use crate::crawler::fetcher::{build_http_client, DocumentSource, FetchErrorKind, WikiSource};
use crate::crawler::outline::extract_outline;
use crate::crawler::relevance::RelevanceClassifier;
use crate::crawler::retry::{fetch_with_retry, FetchOutcome, RetryPolicy};
use crate::logging::LogSession;
use crate::output::{
    generate_markdown_summary, ArticleWriter, CrawlStats, CrawlSummary, RunStatus, SUMMARY_FILE,
};
use crate::state::{FailureCounter, VisitedRegistry};
use crate::url::{canonicalize, normalize_url, DocumentId, Link, LinkFilter};
use crate::{OutlineError, Result};
use chrono::Local;
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

/// What exploring one document produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exploration {
    /// Written to `path`; `neighbors` are its unseen traversable links in link order
    Expanded {
        title: String,
        path: PathBuf,
        neighbors: Vec<DocumentId>,
    },
    /// Fetched but failed the relevance gate; not written, not expanded
    Rejected,
    /// Already processed under this or its resolved identity
    Duplicate,
    /// Permanent fetch failure, malformed page or unwritable article
    Failed,
    /// The current branch must be abandoned
    Unwind,
}

/// Options for [`run_crawl`]
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Recorded in the run summary
    pub config_hash: String,
    /// Load registry snapshots from a previous run before seeding
    pub resume: bool,
    /// Closed once the run summary has been written
    pub log_session: Option<LogSession>,
}

/// Main crawler coordinator structure
///
/// Owns every piece of mutable crawl state; one coordinator drives one run
/// on a single flow of control.
pub struct Coordinator<S> {
    config: Config,
    source: S,
    filter: LinkFilter,
    classifier: RelevanceClassifier,
    writer: ArticleWriter,
    registry: VisitedRegistry,
    policy: RetryPolicy,
    failures: FailureCounter,
    stats: CrawlStats,
    config_hash: String,
    log_session: Option<LogSession>,
}

impl<S: DocumentSource> Coordinator<S> {
    /// Creates a coordinator with an empty visited registry
    pub fn new(config: Config, source: S) -> Result<Self> {
        let filter = LinkFilter::from_config(&config.site)?;
        let classifier = RelevanceClassifier::from_config(&config.relevance);
        let writer = ArticleWriter::new(config.output.articles_dir());
        let registry = VisitedRegistry::new(config.site.content_root.clone());
        let policy = RetryPolicy::from_config(&config.crawler);

        Ok(Self {
            config,
            source,
            filter,
            classifier,
            writer,
            registry,
            policy,
            failures: FailureCounter::new(),
            stats: CrawlStats::default(),
            config_hash: String::new(),
            log_session: None,
        })
    }

    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    pub fn with_log_session(mut self, session: LogSession) -> Self {
        self.log_session = Some(session);
        self
    }

    /// Replaces the registry with the snapshots of a previous run
    pub fn resume(&mut self) -> Result<()> {
        self.registry = VisitedRegistry::load_snapshots(
            &self.config.output.directory,
            self.config.site.content_root.clone(),
        )?;
        tracing::info!(
            "Resuming with {} visited URLs and {} visited titles",
            self.registry.url_count(),
            self.registry.title_count()
        );
        Ok(())
    }

    pub fn registry(&self) -> &VisitedRegistry {
        &self.registry
    }

    pub fn failures(&self) -> FailureCounter {
        self.failures
    }

    pub fn stats(&self) -> CrawlStats {
        self.stats
    }

    /// Canonical seed identifiers, in configured order
    pub fn seed_ids(&self) -> Vec<DocumentId> {
        let mut seeds = Vec::new();
        for seed in &self.config.site.seeds {
            match canonicalize(seed, self.filter.base()) {
                Ok(id) if !seeds.contains(&id) => seeds.push(id),
                Ok(_) => {}
                Err(e) => tracing::warn!("Ignoring seed {:?}: {}", seed, e),
            }
        }
        seeds
    }

    /// Runs the configured traversal to completion
    ///
    /// The registry snapshots and the run summary are written even when the
    /// run is aborted by a connection reset; in that case the summary is
    /// returned with an aborted status. Any other error is returned after
    /// the summary has been written.
    pub async fn run(&mut self) -> Result<CrawlSummary> {
        let started_at = Local::now();
        let seeds = self.seed_ids();
        let traversal = self.config.crawler.traversal;

        tracing::info!(
            "Starting {} crawl from {} seeds",
            traversal.as_str(),
            seeds.len()
        );

        let result = match traversal {
            Traversal::DepthFirst => self.run_depth_first(seeds).await,
            Traversal::BreadthFirst => self.run_breadth_first(seeds).await,
        };

        let (status, error) = match result {
            Ok(()) => (RunStatus::Completed, None),
            Err(e) => {
                tracing::error!("Crawl stopped: {}", e);
                (RunStatus::Aborted(e.to_string()), Some(e))
            }
        };

        let summary = self.finalize(started_at, status)?;

        match error {
            Some(e) if !e.is_fatal_to_run() => Err(e),
            _ => Ok(summary),
        }
    }

    /// Explores a single document
    ///
    /// The registry is checked before any fetch and again against the
    /// resolved identity afterwards, so a document reached through two
    /// references that redirect to the same page is processed once.
    pub async fn explore(&mut self, id: &DocumentId) -> Result<Exploration> {
        if self.skip_if_seen(id) {
            return Ok(Exploration::Duplicate);
        }

        let outcome =
            fetch_with_retry(&self.source, id, &self.policy, &mut self.failures).await?;

        let document = match outcome {
            FetchOutcome::Fetched(document) => document,
            FetchOutcome::Failed { .. } => {
                self.registry.mark_seen(id);
                return Ok(Exploration::Failed);
            }
            FetchOutcome::Skipped { .. } => {
                self.stats.malformed += 1;
                self.registry.mark_seen(id);
                return Ok(Exploration::Failed);
            }
            FetchOutcome::Unwind => {
                self.stats.unwound += 1;
                return Ok(Exploration::Unwind);
            }
        };
        self.stats.explored += 1;

        let resolved = normalize_url(document.resolved_url.clone())
            .ok()
            .map(DocumentId::Url)
            .or_else(|| DocumentId::title(&document.title).ok());

        let already_processed = resolved.as_ref().is_some_and(|r| self.registry.is_seen(r))
            || self.registry.is_title_seen(&document.title);

        self.registry.mark_seen(id);
        if already_processed {
            self.stats.duplicates += 1;
            tracing::debug!(
                id = %id,
                "Resolved to already processed document {:?}",
                document.title
            );
            return Ok(Exploration::Duplicate);
        }
        if let Some(resolved) = &resolved {
            self.registry.mark_resolved(resolved, &document.title);
        }

        if !self.classifier.is_relevant(&document.body_text) {
            self.stats.rejected += 1;
            tracing::info!(
                id = %id,
                "Rejected {:?}: matched {:?}",
                document.title,
                self.classifier.matched_keywords(&document.body_text)
            );
            return Ok(Exploration::Rejected);
        }

        let records = extract_outline(
            &document.title,
            document.headings,
            &self.config.extraction.terminal_sections,
        );
        let path = match self
            .writer
            .write(&document.title, &records, self.registry.url_count())
        {
            Ok(path) => path,
            Err(OutlineError::Io(e)) => {
                self.stats.write_failed += 1;
                tracing::error!(
                    id = %id,
                    path = %self.writer.path_hint(&document.title).display(),
                    "Failed to write {:?}: {}",
                    document.title,
                    e
                );
                return Ok(Exploration::Failed);
            }
            Err(e) => return Err(e),
        };
        self.stats.written += 1;

        let neighbors = self.neighbors(&document.links);
        tracing::info!(
            id = %id,
            path = %path.display(),
            "Wrote {:?} ({} records, {} new links)",
            document.title,
            records.len(),
            neighbors.len()
        );

        Ok(Exploration::Expanded {
            title: document.title,
            path,
            neighbors,
        })
    }

    fn skip_if_seen(&mut self, id: &DocumentId) -> bool {
        if self.registry.is_seen(id) {
            self.stats.duplicates += 1;
            tracing::trace!(id = %id, "Already processed");
            true
        } else {
            false
        }
    }

    /// Unseen traversable links, deduplicated, in link order
    fn neighbors(&self, links: &[Link]) -> Vec<DocumentId> {
        let mut queued = HashSet::new();
        links
            .iter()
            .filter_map(|link| self.filter.resolve(link))
            .filter(|id| !self.registry.is_seen(id))
            .filter(|id| queued.insert(id.clone()))
            .collect()
    }

    async fn run_depth_first(&mut self, seeds: Vec<DocumentId>) -> Result<()> {
        for seed in seeds {
            self.explore_depth_first(seed, 0).await?;
        }
        Ok(())
    }

    /// Explores `id` and then each of its neighbors' subtrees in link order
    fn explore_depth_first<'a>(
        &'a mut self,
        id: DocumentId,
        depth: u32,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + 'a>> {
        Box::pin(async move {
            if self.skip_if_seen(&id) {
                return Ok(());
            }

            if depth > self.config.crawler.max_recursion_depth {
                // Left unmarked: a shallower path may still reach it
                self.stats.unwound += 1;
                tracing::warn!(
                    id = %id,
                    kind = %FetchErrorKind::RecursionLimit,
                    "Depth {} exceeds {}; unwinding",
                    depth,
                    self.config.crawler.max_recursion_depth
                );
                return Ok(());
            }

            if let Exploration::Expanded { neighbors, .. } = self.explore(&id).await? {
                for neighbor in neighbors {
                    self.explore_depth_first(neighbor, depth + 1).await?;
                }
            }
            Ok(())
        })
    }

    /// FIFO traversal with an optional level cap
    ///
    /// The sequence number of the last entry of the current level is
    /// remembered; popping it ends the level. Once `max_levels` levels have
    /// ended no further neighbors are admitted, but queued entries still drain.
    async fn run_breadth_first(&mut self, seeds: Vec<DocumentId>) -> Result<()> {
        let mut frontier: VecDeque<(u64, DocumentId)> = VecDeque::new();
        let mut queued: HashSet<DocumentId> = HashSet::new();
        let mut next_seq: u64 = 0;

        for seed in seeds {
            if queued.insert(seed.clone()) {
                frontier.push_back((next_seq, seed));
                next_seq += 1;
            }
        }

        let mut levels_remaining = self.config.crawler.max_levels;
        let mut level_end = frontier.back().map(|(seq, _)| *seq);
        let mut admitting = true;

        while let Some((seq, id)) = frontier.pop_front() {
            if let Exploration::Expanded { neighbors, .. } = self.explore(&id).await? {
                if admitting {
                    for neighbor in neighbors {
                        if queued.insert(neighbor.clone()) {
                            frontier.push_back((next_seq, neighbor));
                            next_seq += 1;
                        }
                    }
                }
            }

            if level_end == Some(seq) {
                level_end = frontier.back().map(|(seq, _)| *seq);
                if let Some(remaining) = levels_remaining.as_mut() {
                    *remaining = remaining.saturating_sub(1);
                    if *remaining == 0 && admitting {
                        admitting = false;
                        tracing::info!(
                            "Level cap reached; draining {} queued documents",
                            frontier.len()
                        );
                    }
                }
                tracing::debug!("Level complete; {} documents queued", frontier.len());
            }
        }

        Ok(())
    }

    /// Writes snapshots and the summary, then releases the log file
    fn finalize(
        &mut self,
        started_at: chrono::DateTime<Local>,
        status: RunStatus,
    ) -> Result<CrawlSummary> {
        let dir = self.config.output.directory.clone();
        let (url_path, title_path) = self.registry.write_snapshots(&dir)?;
        tracing::info!(
            "Wrote registry snapshots to {} and {}",
            url_path.display(),
            title_path.display()
        );

        let summary = CrawlSummary {
            started_at,
            finished_at: Local::now(),
            traversal: self.config.crawler.traversal.as_str().to_string(),
            config_hash: self.config_hash.clone(),
            status,
            stats: self.stats,
            failures: self.failures.get(),
            visited_urls: self.registry.url_count(),
            visited_titles: self.registry.title_count(),
        };

        generate_markdown_summary(&summary, &dir.join(SUMMARY_FILE))?;
        tracing::info!("{}", summary.log_line());

        if let Some(session) = &self.log_session {
            session.close()?;
        }

        Ok(summary)
    }
}

/// Runs a complete crawl against the configured wiki over HTTP
///
/// # Example
///
/// ```no_run
/// use wiki_outline::config::load_config;
/// use wiki_outline::crawler::{run_crawl, RunOptions};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let summary = run_crawl(config, RunOptions::default()).await?;
/// println!("{}", summary.log_line());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, options: RunOptions) -> Result<CrawlSummary> {
    let client = build_http_client(&config.user_agent)?;
    let source = WikiSource::new(client, &config.site)?;

    let mut coordinator = Coordinator::new(config, source)?.with_config_hash(options.config_hash);
    if let Some(session) = options.log_session {
        coordinator = coordinator.with_log_session(session);
    }
    if options.resume {
        coordinator.resume()?;
    }

    coordinator.run().await
}
