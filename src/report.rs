//! Assembles a repository's recent activity into a single data bag and renders it.
//!
//! The data bag is handed to a Handlebars template as-is, so its serialized field
//! names are the names a template can use.

use crate::config::RepoId;
use crate::github::RepositoryApi;
use crate::querier::ActivityQuerier;
use crate::records::{comment_summary, Commit, Issue, DATE_FORMAT, PullRequest};
use crate::types::IssueComment;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use handlebars::Handlebars;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Window length used when none (or zero) is requested.
pub const DEFAULT_DAYS: u32 = 7;

/// Template used when no template file is configured.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/report.hbs");

const TEMPLATE_NAME: &str = "report";

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub repo: RepoId,
    pub days: Option<u32>,
    /// Asks the template to say so explicitly when a section has no entries.
    pub report_no_activity: bool,
}

impl ReportRequest {
    pub fn window_days(&self) -> u32 {
        self.days.filter(|days| *days > 0).unwrap_or(DEFAULT_DAYS)
    }
}

/// An issue together with its comments, which are fetched separately.
#[derive(Serialize)]
pub struct IssueEntry {
    #[serde(flatten)]
    pub issue: Issue,
    pub comments: Vec<IssueComment>,
    #[serde(rename = "commentSummary")]
    pub comment_summary: String,
}

/// Everything a report template gets to see.
#[derive(Serialize)]
pub struct ActivityReport {
    pub repo: String,
    pub org: String,
    pub period: u32,
    pub end: String,
    pub commits: Vec<Commit>,
    #[serde(rename = "pullrequestsopen")]
    pub pull_requests_open: Vec<PullRequest>,
    #[serde(rename = "pullrequestsclosed")]
    pub pull_requests_closed: Vec<PullRequest>,
    #[serde(rename = "hasIssues")]
    pub has_issues: bool,
    /// `None` when the repository has issues turned off.
    #[serde(rename = "issuesupdated")]
    pub issues_updated: Option<Vec<IssueEntry>>,
    #[serde(rename = "issuesclosed")]
    pub issues_closed: Option<Vec<IssueEntry>>,
    #[serde(rename = "reportNoActivity")]
    pub report_no_activity: bool,
}

/// Collects the activity of `request.repo` during the window ending at `now`.
///
/// Remote failures are returned as-is; there is no partial report.
pub async fn collect_activity(
    api: &dyn RepositoryApi,
    request: &ReportRequest,
    max_pages: u32,
    now: DateTime<Utc>,
) -> Result<ActivityReport> {
    let days = request.window_days();
    let start = now - Duration::days(i64::from(days));
    let repo = &request.repo;

    tracing::info!(repo = %repo, days, start = %start, "Collecting repository activity");

    let repository = api.repository(repo).await?;
    let querier = ActivityQuerier::new(api, repo, max_pages);

    let commits = querier.recent_commits(start).await?;
    let pull_requests_open = querier.pull_requests_open().await?;
    let pull_requests_closed = querier.pull_requests_closed(start).await?;
    let has_issues = repository.has_issues;

    let (issues_updated, issues_closed) = if has_issues {
        let updated = querier.issues_updated(&repository, start).await?;
        let closed = querier.issues_closed(&repository, start).await?;
        (
            with_comments(api, repo, updated.into_issues(), max_pages).await?,
            with_comments(api, repo, closed.into_issues(), max_pages).await?,
        )
    } else {
        (None, None)
    };

    Ok(ActivityReport {
        repo: repo.repo.clone(),
        org: repo.owner.clone(),
        period: days,
        end: now.format(DATE_FORMAT).to_string(),
        commits,
        pull_requests_open,
        pull_requests_closed,
        has_issues,
        issues_updated,
        issues_closed,
        report_no_activity: request.report_no_activity,
    })
}

async fn with_comments(
    api: &dyn RepositoryApi,
    repo: &RepoId,
    issues: Option<Vec<Issue>>,
    max_pages: u32,
) -> Result<Option<Vec<IssueEntry>>> {
    let Some(issues) = issues else {
        return Ok(None);
    };

    let mut entries = Vec::with_capacity(issues.len());
    for issue in issues {
        let comments = issue.fetch_comments(api, repo, max_pages).await?;
        entries.push(IssueEntry {
            comment_summary: comment_summary(comments.len()),
            issue,
            comments,
        });
    }
    Ok(Some(entries))
}

/// Renders `report` through a Handlebars `template`. Output is plain text, nothing
/// is HTML-escaped.
pub fn render(template: &str, report: &ActivityReport) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
        .register_template_string(TEMPLATE_NAME, template)
        .context("Invalid report template")?;

    handlebars
        .render(TEMPLATE_NAME, report)
        .context("Failed to render report")
}

/// Reads the template at `path`, or falls back to the built-in one.
pub fn load_template(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read template at {}", path.display())),
        None => Ok(DEFAULT_TEMPLATE.to_string()),
    }
}

/// Collects and renders in one go.
pub async fn generate_report(
    api: &dyn RepositoryApi,
    request: &ReportRequest,
    template: &str,
    max_pages: u32,
    now: DateTime<Utc>,
) -> Result<String> {
    let report = collect_activity(api, request, max_pages, now).await?;
    render(template, &report)
}
