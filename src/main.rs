use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use repo_activity::report::{self, ReportRequest};
use repo_activity::{AppConfig, Credentials, GitHubClient, RepoId};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "repo-activity")]
#[command(about = "Print out a summary of GitHub activity", long_about = None)]
#[command(version)]
struct Cli {
    /// Name of an organization
    #[arg(short, long)]
    org: String,

    /// Name of a repository
    #[arg(short, long)]
    repo: String,

    /// Number of days to summarise (defaults to 7)
    #[arg(short, long)]
    days: Option<u32>,

    /// Report explicitly if there is no activity
    #[arg(short = 'n', long = "reportNoActivity")]
    report_no_activity: bool,

    /// GitHub username (authenticating increases the rate limit for hitting the GitHub API)
    #[arg(short, long)]
    username: Option<String>,

    /// GitHub password
    #[arg(short, long)]
    password: Option<String>,

    /// Handlebars template to render the report with (defaults to the built-in one)
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so that stdout only carries the report
    let default_filter = if cli.verbose {
        "repo_activity=debug"
    } else {
        "repo_activity=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(report) => println!("{}", report),
        Err(e) => {
            tracing::error!("Failed to generate report: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().context("Invalid configuration in environment")?;

    let template_path = cli.template.or(config.report_template);
    let template = report::load_template(template_path.as_deref())?;

    let credentials = Credentials::resolve(cli.username, cli.password, config.github_token);
    let client = GitHubClient::new(credentials, config.github_api_url.as_deref())?;

    let request = ReportRequest {
        repo: RepoId::new(cli.org, cli.repo),
        days: cli.days,
        report_no_activity: cli.report_no_activity,
    };

    report::generate_report(
        &client,
        &request,
        &template,
        config.max_github_api_pages,
        Utc::now(),
    )
    .await
}
