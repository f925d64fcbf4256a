//! The scheduled updater: generate, record, publish.
//!
//! One invocation walks the state machine
//! `Start → EnvironmentReady → ContentGenerated → {Committed | NoOpSkipped} →
//! Published | Failed`. Generation and publish failures are fatal; an empty
//! delta is absorbed and the run continues to publish (a remote no-op).
//! There are no retries at this level: re-running the whole pipeline on the
//! next trigger is the recovery mechanism, and the pipeline is idempotent
//! when upstream data is unchanged.

use std::fmt::{self, Display};
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::env::Credentials;
use crate::git::{CommitOutcome, GitError, Repository};
use crate::github::GenerationError;

/// The content-generation step, injected so tests never touch the network.
pub trait Generator {
    /// Produces the statistics artifacts on disk.
    fn generate(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<(), GenerationError>>;
}

/// Why a run failed. Every variant is fatal and surfaces as a non-zero exit.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("content generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The version-control layer failed while recording, for a reason other
    /// than an empty delta.
    #[error("failed to record the revision: {0}")]
    Record(#[source] GitError),

    #[error("failed to publish the revision: {0}")]
    Publish(#[source] GitError),
}

/// The states one invocation moves through. `Published` and `Failed` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    EnvironmentReady,
    ContentGenerated,
    Committed,
    NoOpSkipped,
    Published,
    Failed,
}

impl Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "Start",
            Self::EnvironmentReady => "EnvironmentReady",
            Self::ContentGenerated => "ContentGenerated",
            Self::Committed => "Committed",
            Self::NoOpSkipped => "NoOpSkipped",
            Self::Published => "Published",
            Self::Failed => "Failed",
        })
    }
}

/// How one run records and publishes.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// The paths whose changes get recorded.
    pub paths: Vec<PathBuf>,
    /// The revision message.
    pub message: String,
    /// Whether to publish to the remote. Off for local dry runs.
    pub publish: bool,
}

fn transition(state: &mut RunState, next: RunState) {
    debug!("run state: {state} → {next}");
    *state = next;
}

/// Runs one invocation of the updater.
///
/// The credentials are explicit parameters scoped to this call; nothing is
/// read from ambient globals. At most one revision is created per invocation,
/// and the absence of a diff is not an error.
///
/// # Errors
///
/// Returns a [`RunError`] when generation, recording or publishing fails. On
/// a publish failure the recorded revision stays in local history, ready for
/// the next run.
pub async fn run<G, R>(
    credentials: &Credentials,
    generator: &G,
    repository: &mut R,
    options: &RunOptions,
) -> Result<CommitOutcome, RunError>
where
    G: Generator,
    R: Repository,
{
    let mut state = RunState::Start;
    transition(&mut state, RunState::EnvironmentReady);

    info!("generating content for {}…", credentials.user_name);
    if let Err(err) = generator.generate(credentials).await {
        error!("content generation failed: {err}");
        transition(&mut state, RunState::Failed);
        return Err(err.into());
    }
    transition(&mut state, RunState::ContentGenerated);

    let outcome = match repository.commit(&options.paths, &options.message) {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("failed to record the revision: {err}");
            transition(&mut state, RunState::Failed);
            return Err(RunError::Record(err));
        }
    };
    match &outcome {
        CommitOutcome::Committed(revision) => {
            debug!("revision {revision} recorded");
            transition(&mut state, RunState::Committed);
        }
        CommitOutcome::Skipped => transition(&mut state, RunState::NoOpSkipped),
    }

    if options.publish {
        if let Err(err) = repository.push() {
            error!("failed to publish: {err}");
            transition(&mut state, RunState::Failed);
            return Err(RunError::Publish(err));
        }
    } else {
        info!("publishing disabled, leaving the revision local");
    }
    transition(&mut state, RunState::Published);

    Ok(outcome)
}
