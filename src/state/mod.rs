//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitedRegistry`: which documents have been processed this session,
//!   keyed by canonical URL and canonical title, with JSON snapshots for resumption
//! - `FailureCounter`: how many documents ended in permanent failure

mod failures;
mod visited;

pub use failures::FailureCounter;
pub use visited::{VisitedRegistry, TITLE_SNAPSHOT, URL_SNAPSHOT};
