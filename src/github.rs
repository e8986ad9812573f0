use crate::config::RepoId;
use crate::types::{
    IssueComment, ListState, RawCommit, RawEvent, RawIssue, RawPullRequest, RepoInfo,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use octocrab::{Octocrab, Page};
use serde::Serialize;
use std::fmt;

/// Number of items requested per page for every listing.
pub const PER_PAGE: u8 = 100;

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    /// Whether the server advertised a next page (`rel="next"` in the `Link` header).
    pub has_next: bool,
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>, has_next: bool) -> Self {
        Self { items, has_next }
    }

    /// A page with nothing after it.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, false)
    }
}

impl<T> From<Page<T>> for Listing<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            has_next: page.next.is_some(),
            items: page.items,
        }
    }
}

/// Read-only access to the parts of a hosted repository the digest reports on.
///
/// Listing methods return one page (1-based) of results, at most [`PER_PAGE`] items,
/// and say whether another page follows. Callers decide how far to walk.
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    async fn repository(&self, repo: &RepoId) -> Result<RepoInfo>;

    /// Commits, newest first.
    async fn list_commits(&self, repo: &RepoId, page: u32) -> Result<Listing<RawCommit>>;

    async fn list_pull_requests(
        &self,
        repo: &RepoId,
        state: ListState,
        page: u32,
    ) -> Result<Listing<RawPullRequest>>;

    /// Repository events, newest first.
    async fn list_events(&self, repo: &RepoId, page: u32) -> Result<Listing<RawEvent>>;

    /// Issues in `state` updated at or after `since`, most recently updated first.
    async fn list_issues(
        &self,
        repo: &RepoId,
        state: ListState,
        since: DateTime<Utc>,
        page: u32,
    ) -> Result<Listing<RawIssue>>;

    /// A single issue, including `closed_by`.
    async fn issue(&self, repo: &RepoId, number: u64) -> Result<RawIssue>;

    async fn list_issue_comments(
        &self,
        repo: &RepoId,
        number: u64,
        page: u32,
    ) -> Result<Listing<IssueComment>>;
}

/// How the client authenticates against the API.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Anonymous,
    Basic { username: String, password: String },
    Token(String),
}

impl Credentials {
    /// A username/password pair wins when both halves are present, then a token,
    /// otherwise requests are anonymous.
    pub fn resolve(
        username: Option<String>,
        password: Option<String>,
        token: Option<String>,
    ) -> Self {
        match (username, password, token) {
            (Some(username), Some(password), _) if !username.is_empty() && !password.is_empty() => {
                Credentials::Basic { username, password }
            }
            (_, _, Some(token)) if !token.trim().is_empty() => {
                Credentials::Token(token.trim().to_string())
            }
            _ => Credentials::Anonymous,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => write!(f, "Anonymous"),
            Credentials::Basic { username, .. } => write!(f, "Basic({username}, ****)"),
            Credentials::Token(_) => write!(f, "Token(****)"),
        }
    }
}

#[derive(Serialize)]
struct ListParams<'a> {
    per_page: u8,
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<String>,
}

impl ListParams<'_> {
    fn page(page: u32) -> Self {
        Self {
            per_page: PER_PAGE,
            page,
            state: None,
            sort: None,
            since: None,
        }
    }
}

/// [`RepositoryApi`] backed by the GitHub REST API.
#[derive(Clone)]
pub struct GitHubClient {
    octocrab: Octocrab,
}

impl GitHubClient {
    pub fn new(credentials: Credentials, base_uri: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(base_uri) = base_uri {
            builder = builder
                .base_uri(base_uri)
                .with_context(|| format!("Invalid GitHub API URL: {base_uri}"))?;
        }

        tracing::debug!(credentials = ?credentials, "Building GitHub client");
        builder = match credentials {
            Credentials::Anonymous => builder,
            Credentials::Basic { username, password } => builder.basic_auth(username, password),
            Credentials::Token(token) => builder.personal_token(token),
        };

        Ok(Self {
            octocrab: builder.build().context("Failed to create GitHub client")?,
        })
    }

    fn route(repo: &RepoId, tail: &str) -> String {
        format!("/repos/{}/{}{}", repo.owner, repo.repo, tail)
    }
}

#[async_trait]
impl RepositoryApi for GitHubClient {
    async fn repository(&self, repo: &RepoId) -> Result<RepoInfo> {
        let info = self
            .octocrab
            .get(Self::route(repo, ""), None::<&()>)
            .await
            .with_context(|| format!("Failed to look up repository {repo}"))?;
        Ok(info)
    }

    async fn list_commits(&self, repo: &RepoId, page: u32) -> Result<Listing<RawCommit>> {
        tracing::debug!(repo = %repo, page, "Fetching commits");
        let commits: Page<RawCommit> = self
            .octocrab
            .get(Self::route(repo, "/commits"), Some(&ListParams::page(page)))
            .await
            .with_context(|| format!("Failed to list commits for {repo}"))?;
        Ok(commits.into())
    }

    async fn list_pull_requests(
        &self,
        repo: &RepoId,
        state: ListState,
        page: u32,
    ) -> Result<Listing<RawPullRequest>> {
        tracing::debug!(repo = %repo, state = state.as_str(), page, "Fetching pull requests");
        let params = ListParams {
            state: Some(state.as_str()),
            ..ListParams::page(page)
        };
        let pulls: Page<RawPullRequest> = self
            .octocrab
            .get(Self::route(repo, "/pulls"), Some(&params))
            .await
            .with_context(|| format!("Failed to list {} pull requests for {repo}", state.as_str()))?;
        Ok(pulls.into())
    }

    async fn list_events(&self, repo: &RepoId, page: u32) -> Result<Listing<RawEvent>> {
        tracing::debug!(repo = %repo, page, "Fetching events");
        let events: Page<RawEvent> = self
            .octocrab
            .get(Self::route(repo, "/events"), Some(&ListParams::page(page)))
            .await
            .with_context(|| format!("Failed to list events for {repo}"))?;
        Ok(events.into())
    }

    async fn list_issues(
        &self,
        repo: &RepoId,
        state: ListState,
        since: DateTime<Utc>,
        page: u32,
    ) -> Result<Listing<RawIssue>> {
        tracing::debug!(repo = %repo, state = state.as_str(), page, "Fetching issues");
        let params = ListParams {
            state: Some(state.as_str()),
            sort: Some("updated"),
            since: Some(since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ..ListParams::page(page)
        };
        let issues: Page<RawIssue> = self
            .octocrab
            .get(Self::route(repo, "/issues"), Some(&params))
            .await
            .with_context(|| format!("Failed to list {} issues for {repo}", state.as_str()))?;
        Ok(issues.into())
    }

    async fn issue(&self, repo: &RepoId, number: u64) -> Result<RawIssue> {
        let issue = self
            .octocrab
            .get(Self::route(repo, &format!("/issues/{number}")), None::<&()>)
            .await
            .with_context(|| format!("Failed to fetch issue #{number} of {repo}"))?;
        Ok(issue)
    }

    async fn list_issue_comments(
        &self,
        repo: &RepoId,
        number: u64,
        page: u32,
    ) -> Result<Listing<IssueComment>> {
        let comments: Page<IssueComment> = self
            .octocrab
            .get(
                Self::route(repo, &format!("/issues/{number}/comments")),
                Some(&ListParams::page(page)),
            )
            .await
            .with_context(|| format!("Failed to list comments of issue #{number} of {repo}"))?;
        Ok(comments.into())
    }
}
