//! Walks a repository's merged pull requests and counts reviews, review
//! comments and commits per author.
//!
//! Requests are issued strictly one at a time. The closed pull request
//! listing is always fetched live and is limited to a single page of
//! `LISTING_PAGE_SIZE` entries; everything per pull request goes through
//! the response cache.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::github::paginate::list_all_pages;
use crate::github::types::{Commit, PullRequestRecord, Review, ReviewComment};
use crate::github::{ApiError, FetchCache, Transport};
use crate::stats::{CounterStore, RepositoryStats};

/// Number of closed pull requests requested from the listing endpoint.
/// Older pull requests are not visited.
pub const LISTING_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Unexpected payload for {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },
}

/// Inclusive merge-time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateWindow {
    pub fn new<Tz: TimeZone>(from: DateTime<Tz>, to: DateTime<Tz>) -> Self {
        Self {
            from: from.with_timezone(&Utc),
            to: to.with_timezone(&Utc),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }
}

/// Parse a command-line timestamp: RFC 3339, or a bare `YYYY-MM-DD` date
/// taken as midnight UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().fixed_offset())
        .ok_or_else(|| format!("invalid timestamp '{value}', expected RFC 3339 or YYYY-MM-DD"))
}

/// Validate a repository identifier of the form `owner/name`.
pub fn parse_repository(value: &str) -> Result<String, String> {
    match value.split_once('/') {
        Some((owner, name))
            if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
        {
            Ok(value.to_string())
        }
        _ => Err(format!("invalid repository '{value}', expected owner/name")),
    }
}

/// Collects pull request statistics through a `FetchCache`.
pub struct Aggregator<T> {
    cache: FetchCache<T>,
}

impl<T: Transport> Aggregator<T> {
    pub fn new(cache: FetchCache<T>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &FetchCache<T> {
        &self.cache
    }

    /// Count activity on pull requests of `repository` merged within `window`.
    #[instrument(skip(self, window), fields(from = %window.from, to = %window.to))]
    pub async fn run(
        &self,
        repository: &str,
        window: &DateWindow,
    ) -> Result<RepositoryStats, AggregateError> {
        self.cache.check_cache_dir().await?;

        let root = format!("/repos/{repository}");
        let mut stats = CounterStore::new();

        let listing_path = format!(
            "{root}/pulls?state=closed&sort=updated&direction=desc&per_page={LISTING_PAGE_SIZE}"
        );
        let pulls: Vec<PullRequestRecord> =
            decode(&listing_path, self.cache.get(&listing_path, false).await?)?;
        debug!(count = pulls.len(), "listed closed pull requests");

        for pr in &pulls {
            let Some(merged_at) = pr.merged_at else {
                continue;
            };
            if !window.contains(merged_at) {
                continue;
            }

            info!(
                number = pr.number,
                merged_at = %merged_at.to_rfc3339(),
                author = pr.author(),
                title = %pr.title,
                "merged pull request"
            );
            debug!(created_at = %pr.created_at, updated_at = %pr.updated_at, "pull request timeline");
            stats.increment(&["pr"]);

            self.count_reviews(&root, pr.number, &mut stats).await?;
            self.count_commits(&root, pr.number, &mut stats).await?;
        }

        Ok(RepositoryStats {
            repository: repository.to_string(),
            data: stats.snapshot(),
        })
    }

    async fn count_reviews(
        &self,
        root: &str,
        number: u64,
        stats: &mut CounterStore,
    ) -> Result<(), AggregateError> {
        let reviews_path = format!("{root}/pulls/{number}/reviews");
        let reviews: Vec<Review> = decode(
            &reviews_path,
            Value::Array(list_all_pages(&self.cache, &reviews_path).await?),
        )?;

        let mut approvers = HashSet::new();
        for review in &reviews {
            stats.increment(&["pr", "review", review.state.as_str()]);

            if review.state.is_approved() && approvers.insert(review.author()) {
                stats.increment(&["pr", "review", "approval", review.author()]);
            }

            let comments_path = format!("{root}/pulls/{number}/reviews/{}/comments", review.id);
            let comments: Vec<ReviewComment> =
                decode(&comments_path, self.cache.get(&comments_path, true).await?)?;
            for comment in &comments {
                let kind = if comment.is_reply() { "reply" } else { "comment" };
                stats.increment(&["pr", "review", kind, comment.author()]);
            }
        }

        Ok(())
    }

    async fn count_commits(
        &self,
        root: &str,
        number: u64,
        stats: &mut CounterStore,
    ) -> Result<(), AggregateError> {
        let commits_path = format!("{root}/pulls/{number}/commits");
        let commits: Vec<Commit> =
            decode(&commits_path, self.cache.get(&commits_path, true).await?)?;

        for author in commits.iter().filter_map(Commit::author_login) {
            stats.increment(&["pr", "commit", author]);
        }

        Ok(())
    }
}

fn decode<D: DeserializeOwned>(path: &str, value: Value) -> Result<D, AggregateError> {
    serde_json::from_value(value).map_err(|source| AggregateError::Decode {
        path: path.to_string(),
        source,
    })
}
