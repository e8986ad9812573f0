//! Collection queries for a single repository's recent activity.
//!
//! Every query walks the paginated listings of a [`RepositoryApi`] page by page.
//! Feeds that GitHub returns newest first (commits, events) are scanned with an early
//! exit: the walk stops at the first item older than the window start. That relies on
//! the feed really being ordered; an out-of-order item ends the scan early.

use crate::config::RepoId;
use crate::github::{Listing, RepositoryApi};
use crate::records::{ClosingEvent, Commit, Issue, PullRequest};
use crate::types::{ListState, RawIssue, RepoInfo};
use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::ops::ControlFlow;

/// Outcome of an issue query. A repository with issues turned off is reported as
/// [`IssueActivity::Disabled`], never as an empty list.
pub enum IssueActivity {
    Disabled,
    Enabled(Vec<Issue>),
}

impl IssueActivity {
    pub fn is_disabled(&self) -> bool {
        matches!(self, IssueActivity::Disabled)
    }

    pub fn into_issues(self) -> Option<Vec<Issue>> {
        match self {
            IssueActivity::Disabled => None,
            IssueActivity::Enabled(issues) => Some(issues),
        }
    }
}

/// Fetches pages 1..=`max_pages` and hands each item to `visit` until it breaks,
/// the server stops advertising a next page, or the page limit is reached.
///
/// Some listings (repository events) are capped server-side and reject requests
/// past their last page, so the walk never asks for a page that was not advertised.
pub(crate) async fn walk_pages<'a, T>(
    what: &str,
    max_pages: u32,
    mut fetch: impl FnMut(u32) -> BoxFuture<'a, Result<Listing<T>>>,
    mut visit: impl FnMut(T) -> ControlFlow<()>,
) -> Result<()> {
    for page_num in 1..=max_pages {
        let page = fetch(page_num).await?;

        for item in page.items {
            if visit(item).is_break() {
                return Ok(());
            }
        }

        if !page.has_next {
            return Ok(());
        }
    }

    tracing::warn!(
        "Hit max_github_api_pages ({}) while listing {}. Data may be incomplete.",
        max_pages,
        what
    );
    Ok(())
}

/// Picks the actor of the latest closing event recorded for pull request `number`.
/// A pull request closed, reopened and closed again has several events.
pub fn find_closer(number: u64, events: &[ClosingEvent]) -> Option<&str> {
    events
        .iter()
        .filter(|event| event.number == number)
        .max_by_key(|event| event.created_at)
        .map(|event| event.actor.as_str())
}

pub struct ActivityQuerier<'a> {
    api: &'a dyn RepositoryApi,
    repo: &'a RepoId,
    max_pages: u32,
}

impl<'a> ActivityQuerier<'a> {
    pub fn new(api: &'a dyn RepositoryApi, repo: &'a RepoId, max_pages: u32) -> Self {
        Self {
            api,
            repo,
            max_pages,
        }
    }

    /// Commits from the most recent back to `start` (inclusive).
    #[tracing::instrument(skip_all, fields(repo = %self.repo))]
    pub async fn recent_commits(&self, start: DateTime<Utc>) -> Result<Vec<Commit>> {
        let (api, repo) = (self.api, self.repo);
        let mut commits = Vec::new();

        walk_pages(
            "commits",
            self.max_pages,
            move |page| api.list_commits(repo, page),
            |raw| {
                let commit = Commit::new(raw);
                if commit.authored_at() < start {
                    return ControlFlow::Break(());
                }
                commits.push(commit);
                ControlFlow::Continue(())
            },
        )
        .await?;

        tracing::info!(count = commits.len(), "Collected recent commits");
        Ok(commits)
    }

    #[tracing::instrument(skip_all, fields(repo = %self.repo))]
    pub async fn pull_requests_open(&self) -> Result<Vec<PullRequest>> {
        let (api, repo) = (self.api, self.repo);
        let mut pulls = Vec::new();

        walk_pages(
            "open pull requests",
            self.max_pages,
            move |page| api.list_pull_requests(repo, ListState::Open, page),
            |raw| {
                pulls.push(PullRequest::new(raw));
                ControlFlow::Continue(())
            },
        )
        .await?;

        tracing::info!(count = pulls.len(), "Collected open pull requests");
        Ok(pulls)
    }

    /// Pull requests closed after `start`, each attributed to whoever closed it when
    /// the event feed still holds the closing event.
    #[tracing::instrument(skip_all, fields(repo = %self.repo))]
    pub async fn pull_requests_closed(&self, start: DateTime<Utc>) -> Result<Vec<PullRequest>> {
        let (api, repo) = (self.api, self.repo);
        let mut pulls = Vec::new();

        walk_pages(
            "closed pull requests",
            self.max_pages,
            move |page| api.list_pull_requests(repo, ListState::Closed, page),
            |raw| {
                if raw.closed_at.is_some_and(|closed_at| start < closed_at) {
                    pulls.push(PullRequest::new(raw));
                }
                ControlFlow::Continue(())
            },
        )
        .await?;

        let closing_events = self.pull_request_closing_events(start).await?;
        for pull in &mut pulls {
            let closer = find_closer(pull.number(), &closing_events);
            if closer.is_none() {
                tracing::warn!(number = pull.number(), "No closing event found for pull request");
            }
            pull.add_closer(closer);
        }

        tracing::info!(count = pulls.len(), "Collected closed pull requests");
        Ok(pulls)
    }

    /// Pull request `closed` events newer than `start`, newest first.
    #[tracing::instrument(skip_all, fields(repo = %self.repo))]
    pub async fn pull_request_closing_events(
        &self,
        start: DateTime<Utc>,
    ) -> Result<Vec<ClosingEvent>> {
        let (api, repo) = (self.api, self.repo);
        let mut events = Vec::new();

        walk_pages(
            "events",
            self.max_pages,
            move |page| api.list_events(repo, page),
            |raw| {
                if raw.created_at < start {
                    return ControlFlow::Break(());
                }
                events.extend(ClosingEvent::from_event(&raw));
                ControlFlow::Continue(())
            },
        )
        .await?;

        tracing::debug!(count = events.len(), "Collected pull request closing events");
        Ok(events)
    }

    /// Open issues updated since `start`.
    pub async fn issues_updated(
        &self,
        repository: &RepoInfo,
        start: DateTime<Utc>,
    ) -> Result<IssueActivity> {
        if !repository.has_issues {
            return Ok(IssueActivity::Disabled);
        }
        let raw = self.list_issues(ListState::Open, start).await?;
        tracing::info!(repo = %self.repo, count = raw.len(), "Collected updated issues");
        Ok(IssueActivity::Enabled(raw.into_iter().map(Issue::new).collect()))
    }

    /// Closed issues updated since `start`, with their closer filled in.
    pub async fn issues_closed(
        &self,
        repository: &RepoInfo,
        start: DateTime<Utc>,
    ) -> Result<IssueActivity> {
        if !repository.has_issues {
            return Ok(IssueActivity::Disabled);
        }

        let mut issues = Vec::new();
        for raw in self.list_issues(ListState::Closed, start).await? {
            // Listings leave out `closed_by`; only the single-issue endpoint has it.
            let raw = if raw.closed_by.is_none() {
                self.api.issue(self.repo, raw.number).await?
            } else {
                raw
            };
            issues.push(Issue::new(raw));
        }

        tracing::info!(repo = %self.repo, count = issues.len(), "Collected closed issues");
        Ok(IssueActivity::Enabled(issues))
    }

    async fn list_issues(&self, state: ListState, since: DateTime<Utc>) -> Result<Vec<RawIssue>> {
        let (api, repo) = (self.api, self.repo);
        let mut issues = Vec::new();

        walk_pages(
            &format!("{} issues", state.as_str()),
            self.max_pages,
            move |page| api.list_issues(repo, state, since, page),
            |raw| {
                issues.push(raw);
                ControlFlow::Continue(())
            },
        )
        .await?;

        Ok(issues)
    }
}
