//! Raw payloads returned by the GitHub REST API.
//!
//! Only the fields the digest reads are modelled; everything else in the responses
//! is ignored. Fields GitHub may omit or send as `null` are `Option`s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
}

/// `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub has_issues: bool,
}

/// An entry of `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCommit {
    pub sha: String,
    /// The GitHub account linked to the commit author, absent when the author email
    /// does not match any account.
    pub author: Option<Account>,
    pub commit: GitCommit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitCommit {
    pub message: String,
    pub author: GitSignature,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitSignature {
    pub name: Option<String>,
    pub date: DateTime<Utc>,
}

/// An entry of `GET /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub user: Account,
    pub closed_at: Option<DateTime<Utc>>,
}

/// An entry of `GET /repos/{owner}/{repo}/events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub actor: Account,
    #[serde(default)]
    pub payload: EventPayload,
    pub created_at: DateTime<Utc>,
}

/// The subset of event payloads shared by pull request events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPayload {
    pub action: Option<String>,
    pub number: Option<u64>,
}

/// An entry of `GET /repos/{owner}/{repo}/issues`, or `GET .../issues/{number}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawIssue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub user: Account,
    pub assignee: Option<Account>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Only present on the single-issue endpoint.
    #[serde(default)]
    pub closed_by: Option<Account>,
}

/// An entry of `GET /repos/{owner}/{repo}/issues/{number}/comments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    pub user: Option<Account>,
    #[serde(default)]
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Pull request state filter for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListState {
    Open,
    Closed,
}

impl ListState {
    pub fn as_str(self) -> &'static str {
        match self {
            ListState::Open => "open",
            ListState::Closed => "closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_without_linked_account() {
        let json = serde_json::json!({
            "sha": "abc123",
            "author": null,
            "commit": {
                "message": "Fix typo\n\nLonger body",
                "author": { "name": "Someone", "date": "2024-01-03T10:00:00Z" }
            },
            "url": "ignored"
        });

        let commit: RawCommit = serde_json::from_value(json).unwrap();
        assert!(commit.author.is_none());
        assert_eq!(commit.commit.author.date.to_rfc3339(), "2024-01-03T10:00:00+00:00");
    }

    #[test]
    fn test_event_payload_defaults() {
        let json = serde_json::json!({
            "type": "WatchEvent",
            "actor": { "login": "octocat" },
            "payload": { "action": "started" },
            "created_at": "2024-01-03T10:00:00Z"
        });

        let event: RawEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.kind, "WatchEvent");
        assert_eq!(event.payload.action.as_deref(), Some("started"));
        assert!(event.payload.number.is_none());
    }
}
