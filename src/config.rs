//! Application configuration and environment variable parsing.
//!
//! Settings that do not belong on the command line (API token, alternate API host,
//! pagination limit, default template) are loaded from the environment, optionally
//! seeded from a `.env` file by the binary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A unique identifier for a GitHub repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// The organization (or user) owning the repository (e.g., "mozilla").
    pub owner: String,
    /// The name of the repository (e.g., "pdf.js").
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        // Sanitize inputs to prevent path traversal or unintended endpoint access
        Self {
            owner: owner.into().trim().replace("..", ""),
            repo: repo.into().trim().replace("..", ""),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Optional GitHub Personal Access Token for higher rate limits.
    /// Only used when no username/password pair is given on the command line.
    #[serde(default)]
    pub github_token: Option<String>,

    /// Alternate API base URI, e.g. a GitHub Enterprise host.
    #[serde(default)]
    pub github_api_url: Option<String>,

    /// Hard limit on the number of paginated requests made for a single listing.
    #[serde(default = "default_max_pages")]
    pub max_github_api_pages: u32,

    /// Template file used when none is given on the command line.
    #[serde(default)]
    pub report_template: Option<PathBuf>,
}

fn default_max_pages() -> u32 {
    10
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}
