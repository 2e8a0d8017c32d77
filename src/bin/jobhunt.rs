//! CLI binary for jobhunt.
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use jobhunt::store::save_new_listings;
use jobhunt::{CandidateProfile, HuntConfig, JobHunter, SqliteJobStore};
use jobhunt_search::{Aggregator, ExperienceLevel, JobType, SearchQuery, SourceKind};
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// jobhunt: search job boards and rank listings against your resume.
#[derive(Parser)]
#[command(name = "jobhunt", version, about)]
struct Cli {
    /// Path to TOML configuration file (defaults to ~/.config/jobhunt/config.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Aggregate listings from every enabled source.
    Search {
        #[command(flatten)]
        query: QueryArgs,

        /// Print per-source status alongside the listings.
        #[arg(long)]
        report: bool,
    },

    /// Aggregate listings and rank them against a candidate profile.
    Match {
        #[command(flatten)]
        query: QueryArgs,

        /// JSON file with `summary` and `technical_skills`.
        #[arg(short, long)]
        profile: PathBuf,
    },

    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Args)]
struct QueryArgs {
    /// Free-text query, e.g. "ml engineer".
    text: String,

    #[arg(short, long)]
    location: Option<String>,

    /// remote, hybrid or on-site.
    #[arg(long)]
    job_type: Option<JobType>,

    /// entry, mid or senior.
    #[arg(long)]
    experience: Option<ExperienceLevel>,

    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Restrict to these sources (repeatable).
    #[arg(long = "source")]
    sources: Vec<SourceKind>,

    /// Overall deadline in seconds.
    #[arg(long)]
    deadline: Option<u64>,
}

impl QueryArgs {
    fn to_query(&self, config: &HuntConfig) -> SearchQuery {
        let mut query = SearchQuery::new(self.text.clone())
            .with_location(
                self.location
                    .clone()
                    .unwrap_or_else(|| config.query.location.clone()),
            )
            .with_limit(self.limit.unwrap_or(config.query.limit));
        if let Some(job_type) = self.job_type {
            query = query.with_job_type(job_type);
        }
        if let Some(level) = self.experience {
            query = query.with_experience_level(level);
        }
        query
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
            .map(|secs| Instant::now() + Duration::from_secs(secs))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("jobhunt=info,jobhunt_search=info,ort=warn,hf_hub=warn")
        }))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Search { query, report } => run_search(config, &query, report).await,
        Command::Match { query, profile } => run_match(config, &query, &profile).await,
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// Explicit path must exist; the default path is optional.
fn load_config(path: Option<&Path>) -> anyhow::Result<HuntConfig> {
    let config = match path {
        Some(path) => HuntConfig::from_file(path)?,
        None => {
            let default = HuntConfig::default_config_path();
            if default.exists() {
                info!("using config {}", default.display());
                HuntConfig::from_file(&default)?
            } else {
                HuntConfig::default()
            }
        }
    };
    config.validate()?;
    Ok(config)
}

fn with_sources(mut config: HuntConfig, args: &QueryArgs) -> HuntConfig {
    if !args.sources.is_empty() {
        config.search.sources = args.sources.clone();
    }
    config
}

async fn run_search(config: HuntConfig, args: &QueryArgs, report: bool) -> anyhow::Result<()> {
    let config = with_sources(config, args);
    let query = args.to_query(&config);
    let aggregator = Aggregator::new(config.search.clone())?;
    let result = aggregator.search_until(&query, args.deadline()).await?;

    if let Some(path) = config.storage.sqlite_path.clone() {
        let listings = result.listings.clone();
        let persisted = tokio::task::spawn_blocking(move || {
            SqliteJobStore::open(&path).and_then(|store| save_new_listings(&store, &listings))
        })
        .await;
        match persisted {
            Ok(Ok(saved)) => info!(saved, "persisted new listings"),
            Ok(Err(e)) => warn!(error = %e, "failed to persist listings"),
            Err(e) => warn!(error = %e, "persist task failed"),
        }
    }

    let json = if report {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string_pretty(&result.listings)?
    };
    println!("{json}");
    Ok(())
}

async fn run_match(config: HuntConfig, args: &QueryArgs, profile: &Path) -> anyhow::Result<()> {
    let config = with_sources(config, args);
    let profile = CandidateProfile::from_json_file(profile)?;
    let query = args.to_query(&config);
    let hunter = JobHunter::from_config(&config).await?;
    let results = hunter
        .match_jobs_until(&profile, &query, args.deadline())
        .await?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
