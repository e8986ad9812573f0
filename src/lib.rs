//! Plain-text digests of a GitHub repository's recent activity.
//!
//! Commits, pull requests and issues from a trailing window of days are fetched
//! through a [`github::RepositoryApi`], wrapped as [`records`], and rendered with a
//! Handlebars template by [`report`].

pub mod config;
pub mod github;
pub mod querier;
pub mod records;
pub mod report;
pub mod types;

pub use config::{AppConfig, RepoId};
pub use github::{Credentials, GitHubClient, Listing, RepositoryApi};
pub use report::{collect_activity, generate_report, ActivityReport, ReportRequest};
