/// Count of documents that ended in permanent fetch failure
///
/// Owned by the crawl orchestrator and threaded by reference into the retry
/// layer. It only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureCounter(u64);

impl FailureCounter {
    pub fn new() -> Self {
        Self(0)
    }

    /// Records one more permanently failed document
    pub fn increment(&mut self) {
        self.0 += 1;
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}
