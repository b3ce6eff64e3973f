use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator between segments in the rendered counter key.
pub const KEY_SEPARATOR: &str = ".";

/// Hierarchical counter key, e.g. `["pr", "review", "approval", "alice"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterPath {
    segments: Vec<String>,
}

impl CounterPath {
    pub fn new<S: AsRef<str>>(segments: &[S]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// Dotted key text, e.g. `pr.review.approval.alice`.
    pub fn key(&self) -> String {
        self.segments.join(KEY_SEPARATOR)
    }

    /// The immediate parent: every segment but the last. None for a
    /// single-segment (or empty) path.
    pub fn parent(&self) -> Option<CounterPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }
}

/// Immutable view of accumulated counters, ordered by dotted key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsSnapshot(BTreeMap<String, u64>);

impl StatsSnapshot {
    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, u64)> for StatsSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The document printed by `collect` and read back by `report`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryStats {
    /// Repository in `owner/name` form
    pub repository: String,
    pub data: StatsSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_path_key_and_parent() {
        let path = CounterPath::new(&["pr", "review", "approval", "alice"]);
        assert_eq!(path.key(), "pr.review.approval.alice");
        assert_eq!(path.parent().unwrap().key(), "pr.review.approval");
        assert!(CounterPath::new(&["pr"]).parent().is_none());
    }

    #[test]
    fn test_snapshot_serializes_in_key_order() {
        let snapshot: StatsSnapshot = vec![
            ("pr.review".to_string(), 2),
            ("pr".to_string(), 1),
            ("pr.commit".to_string(), 3),
        ]
        .into_iter()
        .collect();
        let stats = RepositoryStats {
            repository: "org/repo".to_string(),
            data: snapshot,
        };

        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(
            json,
            r#"{"repository":"org/repo","data":{"pr":1,"pr.commit":3,"pr.review":2}}"#
        );
    }
}
