pub mod types;

pub use types::{CounterPath, RepositoryStats, StatsSnapshot};

use std::collections::HashMap;

/// Accumulates hierarchical counters for one aggregation run.
///
/// Incrementing a path also increments its immediate parent, and only that:
/// `pr.review.approval.alice` bumps `pr.review.approval` but not `pr.review`.
#[derive(Debug, Default)]
pub struct CounterStore {
    counts: HashMap<CounterPath, u64>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter at `segments` and its immediate parent by one.
    /// An empty path is ignored.
    pub fn increment<S: AsRef<str>>(&mut self, segments: &[S]) {
        if segments.is_empty() {
            return;
        }
        let path = CounterPath::new(segments);
        if let Some(parent) = path.parent() {
            self.bump(parent);
        }
        self.bump(path);
    }

    fn bump(&mut self, path: CounterPath) {
        *self.counts.entry(path).or_insert(0) += 1;
    }

    /// All counters keyed by dotted key text, sorted by that text.
    pub fn snapshot(&self) -> StatsSnapshot {
        self.counts
            .iter()
            .map(|(path, count)| (path.key(), *count))
            .collect()
    }
}
