//! Read-only views over raw API payloads, as they appear in a digest.
//!
//! Optional remote fields never fail an accessor: they are replaced with fixed
//! placeholder strings instead.

use crate::config::RepoId;
use crate::github::RepositoryApi;
use crate::querier::walk_pages;
use crate::types::{IssueComment, RawCommit, RawEvent, RawIssue, RawPullRequest};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::ops::ControlFlow;

/// Date format used for every timestamp in a digest.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Shown when a commit is not linked to any account.
pub const UNKNOWN_COMMIT_AUTHOR: &str = "None?";
/// Shown when the closer of a pull request or issue could not be determined.
pub const UNKNOWN_CLOSER: &str = "?";
/// Shown when an issue has no assignee.
pub const UNASSIGNED: &str = "no";

fn format_date(ts: DateTime<Utc>) -> String {
    ts.format(DATE_FORMAT).to_string()
}

pub struct Commit {
    raw: RawCommit,
}

impl Commit {
    pub fn new(raw: RawCommit) -> Self {
        Self { raw }
    }

    pub fn sha(&self) -> &str {
        &self.raw.sha
    }

    pub fn author(&self) -> &str {
        self.raw
            .author
            .as_ref()
            .map(|account| account.login.as_str())
            .unwrap_or(UNKNOWN_COMMIT_AUTHOR)
    }

    /// First non-blank line of the commit message, trimmed.
    pub fn message(&self) -> &str {
        self.raw
            .commit
            .message
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
    }

    pub fn authored_at(&self) -> DateTime<Utc> {
        self.raw.commit.author.date
    }

    pub fn timestamp(&self) -> String {
        format_date(self.authored_at())
    }
}

impl Serialize for Commit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Commit", 4)?;
        state.serialize_field("sha", self.sha())?;
        state.serialize_field("author", self.author())?;
        state.serialize_field("message", self.message())?;
        state.serialize_field("timestamp", &self.timestamp())?;
        state.end()
    }
}

pub struct PullRequest {
    raw: RawPullRequest,
    closer: String,
}

impl PullRequest {
    pub fn new(raw: RawPullRequest) -> Self {
        Self {
            raw,
            closer: UNKNOWN_CLOSER.to_string(),
        }
    }

    pub fn number(&self) -> u64 {
        self.raw.number
    }

    pub fn title(&self) -> &str {
        &self.raw.title
    }

    pub fn author(&self) -> &str {
        &self.raw.user.login
    }

    pub fn url(&self) -> &str {
        &self.raw.html_url
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.raw.closed_at
    }

    /// Only meaningful for closed pull requests.
    pub fn closed_timestamp(&self) -> Option<String> {
        self.raw.closed_at.map(format_date)
    }

    pub fn closer(&self) -> &str {
        &self.closer
    }

    /// Records who closed the pull request. Empty or missing values are ignored,
    /// so a failed lookup never erases a closer found earlier.
    pub fn add_closer(&mut self, closer: Option<&str>) {
        if let Some(closer) = closer.filter(|c| !c.is_empty()) {
            self.closer = closer.to_string();
        }
    }
}

impl Serialize for PullRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PullRequest", 6)?;
        state.serialize_field("number", &self.number())?;
        state.serialize_field("title", self.title())?;
        state.serialize_field("author", self.author())?;
        state.serialize_field("url", self.url())?;
        state.serialize_field("closedTimestamp", &self.closed_timestamp())?;
        state.serialize_field("closer", self.closer())?;
        state.end()
    }
}

/// A pull request being closed, taken from the repository event feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosingEvent {
    pub number: u64,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

impl ClosingEvent {
    /// Returns `None` unless the event is a `closed` action on a pull request.
    pub fn from_event(event: &RawEvent) -> Option<Self> {
        if event.kind != "PullRequestEvent" || event.payload.action.as_deref() != Some("closed") {
            return None;
        }
        Some(Self {
            number: event.payload.number?,
            actor: event.actor.login.clone(),
            created_at: event.created_at,
        })
    }
}

pub struct Issue {
    raw: RawIssue,
}

impl Issue {
    pub fn new(raw: RawIssue) -> Self {
        Self { raw }
    }

    pub fn number(&self) -> u64 {
        self.raw.number
    }

    pub fn title(&self) -> &str {
        &self.raw.title
    }

    pub fn url(&self) -> &str {
        &self.raw.html_url
    }

    pub fn author(&self) -> &str {
        &self.raw.user.login
    }

    pub fn assignee(&self) -> &str {
        self.raw
            .assignee
            .as_ref()
            .map(|account| account.login.as_str())
            .unwrap_or(UNASSIGNED)
    }

    pub fn created(&self) -> String {
        format_date(self.raw.created_at)
    }

    pub fn updated(&self) -> String {
        format_date(self.raw.updated_at)
    }

    pub fn closed(&self) -> Option<String> {
        self.raw.closed_at.map(format_date)
    }

    pub fn closer(&self) -> &str {
        self.raw
            .closed_by
            .as_ref()
            .map(|account| account.login.as_str())
            .unwrap_or(UNKNOWN_CLOSER)
    }

    /// `"new <date>"` for issues not touched since creation (same day),
    /// `"updated <date>"` otherwise.
    pub fn timestamp(&self) -> String {
        let created = self.created();
        let updated = self.updated();
        if created == updated {
            format!("new {created}")
        } else {
            format!("updated {updated}")
        }
    }

    /// Fetches every comment on the issue. Performs remote calls on each invocation.
    pub async fn fetch_comments(
        &self,
        api: &dyn RepositoryApi,
        repo: &RepoId,
        max_pages: u32,
    ) -> Result<Vec<IssueComment>> {
        let number = self.number();
        let mut comments = Vec::new();
        walk_pages(
            "issue comments",
            max_pages,
            move |page| api.list_issue_comments(repo, number, page),
            |comment| {
                comments.push(comment);
                ControlFlow::Continue(())
            },
        )
        .await?;
        Ok(comments)
    }
}

impl Serialize for Issue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Issue", 10)?;
        state.serialize_field("number", &self.number())?;
        state.serialize_field("title", self.title())?;
        state.serialize_field("url", self.url())?;
        state.serialize_field("author", self.author())?;
        state.serialize_field("assignee", self.assignee())?;
        state.serialize_field("created", &self.created())?;
        state.serialize_field("updated", &self.updated())?;
        state.serialize_field("closed", &self.closed())?;
        state.serialize_field("closer", self.closer())?;
        state.serialize_field("timestamp", &self.timestamp())?;
        state.end()
    }
}

pub fn comment_summary(count: usize) -> String {
    match count {
        0 => "No comments".to_string(),
        1 => "1 comment".to_string(),
        n => format!("{n} comments"),
    }
}
