//! The profile-refresh binary: one scheduled invocation of the updater.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use profile_refresh::env::Credentials;
use profile_refresh::git::{CommitOutcome, GitRepository};
use profile_refresh::github::GitHubClient;
use profile_refresh::github::stats::ProfileGenerator;
use profile_refresh::pipeline::{self, RunOptions};

#[derive(Parser, Debug)]
#[command(
    name = "profile-refresh",
    about = "Regenerates GitHub profile statistics cards and commits them back when they change"
)]
struct Cli {
    /// Path to the repository to update (defaults to the current directory).
    #[arg(long)]
    repo: Option<PathBuf>,

    /// Directory holding the lines-of-code cache, relative to the repository.
    #[arg(long, default_value = "cache")]
    cache_dir: PathBuf,

    /// SVG templates to rewrite, relative to the repository.
    #[arg(long = "template", default_values = ["dark_mode.svg", "light_mode.svg"])]
    templates: Vec<PathBuf>,

    /// Birth date rendered into the age field (YYYY-MM-DD).
    #[arg(long, default_value = "2005-03-04")]
    birthday: NaiveDate,

    /// Rebuild the lines-of-code cache from scratch.
    #[arg(long)]
    force_cache: bool,

    /// Record the revision locally without publishing it.
    #[arg(long)]
    no_push: bool,

    /// Message for the recorded revision.
    #[arg(long, default_value = "Update profile statistics")]
    message: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let credentials = Credentials::from_env()?;

    let root = cli.repo.clone().unwrap_or_else(|| PathBuf::from("."));
    let generator = ProfileGenerator::new(
        GitHubClient::new(),
        cli.birthday,
        root.join(&cli.cache_dir),
        cli.templates.iter().map(|t| root.join(t)).collect(),
        cli.force_cache,
    );

    let mut repository = match cli.repo {
        Some(path) => GitRepository::with_repo_path(path),
        None => GitRepository::new(),
    };

    // Paths are staged relative to the repository root.
    let mut paths = cli.templates.clone();
    paths.push(cli.cache_dir.clone());
    let options = RunOptions {
        paths,
        message: cli.message.clone(),
        publish: !cli.no_push,
    };

    match pipeline::run(&credentials, &generator, &mut repository, &options).await? {
        CommitOutcome::Committed(revision) => info!("run complete, published revision {revision}"),
        CommitOutcome::Skipped => info!("run complete, content unchanged"),
    }
    Ok(())
}
