//! CLI binary for feed-digest.
//!
//! Prints the JSON report on stdout. Logs go to stderr. The process exits
//! non-zero only when configuration leaves nothing to run; failing sources
//! are reported inside the JSON.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use digest_search::HttpTransport;
use feed_digest::config::{FeedEntry, RepoEntry};
use feed_digest::{DigestConfig, commands, logging};
use tracing::info;

/// Feed-digest: multi-source retrieval merged into one ranked report.
#[derive(Parser)]
#[command(name = "feed-digest", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging for both crates (overrides RUST_LOG).
    #[arg(short, long)]
    verbose: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Search web-search APIs and configured sites, ranked by score.
    Search {
        /// Search query.
        #[arg(short, long)]
        query: String,
        /// Tavily API key (overrides config).
        #[arg(long)]
        tavily_key: Option<String>,
        /// Exa API key (overrides config).
        #[arg(long)]
        exa_key: Option<String>,
        /// Max results per source.
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// Fetch RSS/Atom feeds, newest first.
    Feeds {
        /// Comma-separated feed URLs (replace the configured feeds).
        #[arg(long, value_delimiter = ',')]
        urls: Vec<String>,
        /// Comma-separated keywords to filter posts.
        #[arg(long, value_delimiter = ',')]
        filter: Vec<String>,
    },

    /// Search or digest repository issues, newest first.
    Issues {
        /// Comma-separated repos as owner/repo (replace the configured repos).
        #[arg(long, value_delimiter = ',')]
        repos: Vec<String>,
        /// Search query; without one, recent open issues are listed.
        #[arg(long)]
        search: Option<String>,
        /// Days to look back in digest mode.
        #[arg(long)]
        days: Option<u32>,
        /// API token (or use GITHUB_TOKEN env).
        #[arg(long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = load_config(cli.config)?;
    let report = match cli.command {
        Command::Search {
            query,
            tavily_key,
            exa_key,
            max_results,
        } => {
            if tavily_key.is_some() {
                config.search.tavily_api_key = tavily_key;
            }
            if exa_key.is_some() {
                config.search.exa_api_key = exa_key;
            }
            if let Some(max_results) = max_results {
                config.pipeline.max_results = max_results;
            }
            let transport = build_transport(&config)?;
            commands::search(&transport, &config, &query).await?
        }
        Command::Feeds { urls, filter } => {
            if !urls.is_empty() {
                config.feeds = urls
                    .into_iter()
                    .map(|url| FeedEntry {
                        url: url.trim().to_owned(),
                        name: None,
                    })
                    .collect();
            }
            if !filter.is_empty() {
                config.feeds_filter.keywords = filter;
            }
            let transport = build_transport(&config)?;
            commands::feeds(&transport, &config).await?
        }
        Command::Issues {
            repos,
            search,
            days,
            token,
        } => {
            if !repos.is_empty() {
                config.repos = repos
                    .into_iter()
                    .map(|repo| RepoEntry {
                        repo: repo.trim().to_owned(),
                        name: None,
                    })
                    .collect();
            }
            if search.is_some() {
                config.issues.search = search;
            }
            if let Some(days) = days {
                config.issues.days = days;
            }
            if token.is_some() {
                config.issues.token = token;
            }
            let token = config.resolve_issue_token();
            let transport = build_transport(&config)?;
            commands::issues(&transport, &config, token.as_deref()).await?
        }
    };

    info!(
        total = report.total_count,
        failed_sources = report.failed_sources(),
        "writing report"
    );
    commands::write_report(&report, std::io::stdout().lock())?;
    Ok(())
}

fn build_transport(config: &DigestConfig) -> digest_search::Result<HttpTransport> {
    HttpTransport::new(&config.pipeline_config())
}

/// Explicit path, else the default path when it exists, else defaults.
fn load_config(path: Option<PathBuf>) -> anyhow::Result<DigestConfig> {
    if let Some(path) = path {
        return Ok(DigestConfig::from_file(&path)?);
    }
    let default_path = DigestConfig::default_config_path();
    if default_path.exists() {
        info!(path = %default_path.display(), "using default config");
        return Ok(DigestConfig::from_file(&default_path)?);
    }
    Ok(DigestConfig::default())
}
