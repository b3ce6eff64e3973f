//! The subset of GitHub REST payloads consumed by the aggregator.
//! Unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// Login GitHub shows for deleted accounts; used when a payload has no user.
pub const GHOST_LOGIN: &str = "ghost";

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

fn login_or_ghost(user: &Option<User>) -> &str {
    user.as_ref().map_or(GHOST_LOGIN, |u| u.login.as_str())
}

/// An entry of `GET /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRecord {
    pub number: u64,
    pub title: String,
    pub user: Option<User>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// None when the pull request was closed without merging
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequestRecord {
    pub fn author(&self) -> &str {
        login_or_ghost(&self.user)
    }
}

/// State of a submitted review, as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
    /// Any state this tool does not know about, kept verbatim
    Other(String),
}

impl ReviewState {
    pub fn as_str(&self) -> &str {
        match self {
            ReviewState::Approved => "APPROVED",
            ReviewState::ChangesRequested => "CHANGES_REQUESTED",
            ReviewState::Commented => "COMMENTED",
            ReviewState::Dismissed => "DISMISSED",
            ReviewState::Pending => "PENDING",
            ReviewState::Other(state) => state,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, ReviewState::Approved)
    }
}

impl From<String> for ReviewState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "APPROVED" => ReviewState::Approved,
            "CHANGES_REQUESTED" => ReviewState::ChangesRequested,
            "COMMENTED" => ReviewState::Commented,
            "DISMISSED" => ReviewState::Dismissed,
            "PENDING" => ReviewState::Pending,
            _ => ReviewState::Other(state),
        }
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry of `GET /repos/{owner}/{repo}/pulls/{number}/reviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub id: u64,
    pub user: Option<User>,
    pub state: ReviewState,
}

impl Review {
    pub fn author(&self) -> &str {
        login_or_ghost(&self.user)
    }
}

/// An entry of `GET /repos/{owner}/{repo}/pulls/{number}/reviews/{id}/comments`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewComment {
    pub user: Option<User>,
    #[serde(default)]
    pub in_reply_to_id: Option<u64>,
}

impl ReviewComment {
    pub fn author(&self) -> &str {
        login_or_ghost(&self.user)
    }

    pub fn is_reply(&self) -> bool {
        self.in_reply_to_id.is_some()
    }
}

/// An entry of `GET /repos/{owner}/{repo}/pulls/{number}/commits`.
#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    /// GitHub account linked to the commit author, None when unattributed
    pub author: Option<User>,
}

impl Commit {
    pub fn author_login(&self) -> Option<&str> {
        self.author.as_ref().map(|u| u.login.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pull_request_record_unmerged() {
        let pr: PullRequestRecord = serde_json::from_value(json!({
            "number": 12,
            "title": "Fix typo",
            "user": { "login": "alice", "id": 1 },
            "created_at": "2021-03-01T10:00:00Z",
            "updated_at": "2021-03-02T10:00:00Z",
            "merged_at": null,
            "state": "closed"
        }))
        .unwrap();
        assert_eq!(pr.number, 12);
        assert_eq!(pr.author(), "alice");
        assert!(pr.merged_at.is_none());
    }

    #[test]
    fn test_review_states() {
        let reviews: Vec<Review> = serde_json::from_value(json!([
            { "id": 1, "user": { "login": "bob" }, "state": "APPROVED" },
            { "id": 2, "user": null, "state": "CHANGES_REQUESTED" },
            { "id": 3, "user": { "login": "eve" }, "state": "SOMETHING_NEW" }
        ]))
        .unwrap();
        assert!(reviews[0].state.is_approved());
        assert_eq!(reviews[1].state, ReviewState::ChangesRequested);
        assert_eq!(reviews[1].author(), GHOST_LOGIN);
        assert_eq!(reviews[2].state.as_str(), "SOMETHING_NEW");
        assert_eq!(reviews[2].state.to_string(), "SOMETHING_NEW");
    }

    #[test]
    fn test_comment_reply_detection() {
        let comments: Vec<ReviewComment> = serde_json::from_value(json!([
            { "user": { "login": "carol" }, "in_reply_to_id": null },
            { "user": { "login": "dave" }, "in_reply_to_id": 99 },
            { "user": { "login": "erin" } }
        ]))
        .unwrap();
        assert!(!comments[0].is_reply());
        assert!(comments[1].is_reply());
        assert!(!comments[2].is_reply());
    }

    #[test]
    fn test_commit_author_optional() {
        let commits: Vec<Commit> = serde_json::from_value(json!([
            { "sha": "a", "author": { "login": "alice" } },
            { "sha": "b", "author": null }
        ]))
        .unwrap();
        assert_eq!(commits[0].author_login(), Some("alice"));
        assert_eq!(commits[1].author_login(), None);
    }
}
