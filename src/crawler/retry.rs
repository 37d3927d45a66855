//! Retry policy around the document source
//!
//! # Retry Logic
//!
//! | Failure | Action |
//! |---------|--------|
//! | Disambiguation, NotFound | Retry once with exact resolution, then give up |
//! | Transient | Wait and retry up to `max_attempts` fetches, then give up |
//! | ConnectionReset | Abort the whole run |
//! | RecursionLimit | Unwind the current branch |
//! | TitleMissing, EmptyContentRoot | Skip the document |
//!
//! Every give-up increments the shared [`FailureCounter`] exactly once.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{DocumentSource, FetchErrorKind, FetchedDocument, Resolution};
use crate::state::FailureCounter;
use crate::url::DocumentId;
use crate::{OutlineError, Result};
use std::time::Duration;

/// Bounded retry parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total fetches allowed for transient failures (including the first)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub backoff: Duration,
    /// Factor applied to each subsequent delay (1.0 = fixed delay)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(5),
            backoff_multiplier: 1.0,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: Duration::from_millis(config.backoff_ms),
            backoff_multiplier: config.backoff_multiplier,
        }
    }

    /// Fresh state for one document
    pub fn start(&self) -> RetryState {
        RetryState {
            attempts_remaining: self.max_attempts.saturating_sub(1),
            fallback_used: false,
            last_delay: None,
        }
    }

    /// Decides what to do after a failure of `kind`, updating `state`
    pub fn next_action(&self, kind: FetchErrorKind, state: &mut RetryState) -> RetryAction {
        match kind {
            FetchErrorKind::Disambiguation | FetchErrorKind::NotFound => {
                if state.fallback_used {
                    RetryAction::GiveUp
                } else {
                    state.fallback_used = true;
                    RetryAction::RetryWithFallback
                }
            }
            FetchErrorKind::Transient => {
                if state.attempts_remaining == 0 {
                    return RetryAction::GiveUp;
                }
                state.attempts_remaining -= 1;
                let delay = match state.last_delay {
                    None => self.backoff,
                    Some(prev) => prev.mul_f64(self.backoff_multiplier),
                };
                state.last_delay = Some(delay);
                RetryAction::Retry(delay)
            }
            FetchErrorKind::ConnectionReset => RetryAction::Abort,
            FetchErrorKind::RecursionLimit => RetryAction::Unwind,
            FetchErrorKind::TitleMissing | FetchErrorKind::EmptyContentRoot => RetryAction::Skip,
        }
    }
}

/// Per-document retry bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    pub attempts_remaining: u32,
    pub fallback_used: bool,
    pub last_delay: Option<Duration>,
}

/// What the retry layer does after a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Sleep, then fetch again with the same resolution
    Retry(Duration),
    /// Fetch again with exact resolution
    RetryWithFallback,
    /// Stop the run
    Abort,
    /// Count a permanent failure and move on
    GiveUp,
    /// Drop the document without counting a failure
    Skip,
    /// Abandon the current branch
    Unwind,
}

/// Final outcome of fetching one document
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(FetchedDocument),
    Failed { kind: FetchErrorKind, message: String },
    Skipped { kind: FetchErrorKind, message: String },
    Unwind,
}

/// Fetches `id` from `source` under `policy`
///
/// # Errors
///
/// Returns `OutlineError::ConnectionReset` when the peer resets the
/// connection; the caller must end the run.
pub async fn fetch_with_retry<S>(
    source: &S,
    id: &DocumentId,
    policy: &RetryPolicy,
    failures: &mut FailureCounter,
) -> Result<FetchOutcome>
where
    S: DocumentSource + ?Sized,
{
    let mut state = policy.start();
    let mut resolution = Resolution::Fuzzy;

    loop {
        let error = match source.fetch(id, resolution).await {
            Ok(document) => return Ok(FetchOutcome::Fetched(document)),
            Err(error) => error,
        };

        match policy.next_action(error.kind, &mut state) {
            RetryAction::Retry(delay) => {
                tracing::warn!(
                    "{} while fetching {}; retrying in {:?} ({} attempts left)",
                    error,
                    id,
                    delay,
                    state.attempts_remaining
                );
                tokio::time::sleep(delay).await;
            }
            RetryAction::RetryWithFallback => {
                tracing::info!("{} for {}; retrying with exact title", error, id);
                resolution = Resolution::Exact;
            }
            RetryAction::GiveUp => {
                failures.increment();
                tracing::error!("Giving up on {}: {}", id, error);
                return Ok(FetchOutcome::Failed {
                    kind: error.kind,
                    message: error.message,
                });
            }
            RetryAction::Skip => {
                tracing::warn!("Skipping malformed page {}: {}", id, error);
                return Ok(FetchOutcome::Skipped {
                    kind: error.kind,
                    message: error.message,
                });
            }
            RetryAction::Unwind => return Ok(FetchOutcome::Unwind),
            RetryAction::Abort => {
                tracing::error!("Connection reset while fetching {}: {}", id, error);
                return Err(OutlineError::ConnectionReset {
                    id: id.to_string(),
                    message: error.message,
                });
            }
        }
    }
}
