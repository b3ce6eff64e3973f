mod aggregate;
mod config;
mod github;
mod report;
mod stats;

use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use aggregate::{Aggregator, DateWindow};
use github::{FetchCache, HttpTransport};

/// gh-stats: collects pull request review, comment and commit statistics
/// for a GitHub repository and summarises them as markdown.
#[derive(Parser, Debug)]
#[command(name = "gh-stats", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count activity on pull requests merged between <FROM> and <TO> (inclusive)
    /// and print it as JSON
    Collect {
        /// Repository in owner/name form (e.g., rust-lang/cargo)
        #[arg(value_parser = aggregate::parse_repository)]
        repository: String,

        /// Start of the merge window (RFC 3339 or YYYY-MM-DD)
        #[arg(value_parser = aggregate::parse_timestamp)]
        from: DateTime<FixedOffset>,

        /// End of the merge window (RFC 3339 or YYYY-MM-DD)
        #[arg(value_parser = aggregate::parse_timestamp)]
        to: DateTime<FixedOffset>,

        /// Ignore the response cache directory for this run
        #[arg(long)]
        no_cache: bool,

        /// Config file path (defaults to .gh-stats.toml in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Render one or more `collect` outputs as a markdown approval summary
    Report {
        /// JSON files written by `collect`
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Optional output file path for the markdown report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gh_stats=info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Collect {
            repository,
            from,
            to,
            no_cache,
            config: config_path,
        } => {
            info!("loading configuration");
            let config = config::Config::load(config_path.as_deref())?;

            let transport = HttpTransport::new(&config)?;
            let cache_dir = if no_cache {
                None
            } else {
                config.cache_dir().map(PathBuf::from)
            };
            let aggregator = Aggregator::new(FetchCache::new(transport, cache_dir));
            debug!(
                cache_dir = ?aggregator.cache().cache_dir(),
                api_url = config.api_url(),
                "configured fetch cache"
            );

            let stats = aggregator
                .run(&repository, &DateWindow::new(from, to))
                .await?;
            if stats.data.is_empty() {
                warn!("no merged pull requests found in the given window");
            }
            info!(counters = stats.data.len(), "collection complete");

            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Report { files, output } => {
            let documents = report::load(&files)?;
            debug!(documents = documents.len(), "loaded stats documents");
            let markdown = report::render(&documents);
            report::output(&markdown, output.as_deref())?;
        }
    }

    Ok(())
}
