//! The version-control collaborator: recording and publishing revisions.
//!
//! [`Repository`] is the seam the pipeline talks through; [`GitRepository`]
//! implements it by shelling out to `git`. "Nothing to commit" is an outcome,
//! not an error, so idle runs stay green.

use std::fmt::{self, Display};
use std::io;
use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

/// Errors from the version-control layer.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("git is not installed or not in PATH")]
    GitNotFound,

    #[error("not a git repository")]
    NotARepository,

    #[error("git command failed (exit code {exit_code}): {stderr}")]
    CommandFailed { stderr: String, exit_code: i32 },

    /// The remote refused the update: authentication failure or a
    /// non-fast-forward conflict with a concurrent publisher.
    #[error("push rejected by the remote: {stderr}")]
    PushRejected { stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// An identifier for one recorded revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision(pub String);

impl Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What recording changes produced: a new revision, or nothing to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Content changed; exactly one revision was created.
    Committed(Revision),
    /// Content is identical to the previous version. Benign.
    Skipped,
}

/// The operations the pipeline needs from a repository.
///
/// Kept minimal so tests can inject a fake collaborator instead of invoking
/// real version-control tooling.
pub trait Repository {
    /// Stages `paths` and records them as a revision, or skips when the
    /// staged content is unchanged.
    ///
    /// # Errors
    ///
    /// Fails on version-control failures other than an empty delta.
    fn commit(&mut self, paths: &[PathBuf], message: &str) -> Result<CommitOutcome, GitError>;

    /// Publishes recorded revisions to the remote history.
    ///
    /// # Errors
    ///
    /// Fails with [`GitError::PushRejected`] when the remote refuses the
    /// update.
    fn push(&mut self) -> Result<(), GitError>;
}

/// A [`Repository`] backed by the `git` binary.
#[derive(Debug, Clone, Default)]
pub struct GitRepository {
    /// Path to the repository (None = current directory).
    repo_path: Option<PathBuf>,
}

impl GitRepository {
    /// Creates a repository handle for the current directory.
    pub fn new() -> Self {
        Self { repo_path: None }
    }

    /// Creates a repository handle for a specific path.
    pub fn with_repo_path(path: PathBuf) -> Self {
        Self {
            repo_path: Some(path),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        if let Some(ref path) = self.repo_path {
            cmd.arg("-C").arg(path);
        }
        cmd
    }

    /// Runs a git command and captures its stdout.
    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.command().args(args).output().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                GitError::GitNotFound
            } else {
                GitError::Io(e)
            }
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            let exit_code = output.status.code().unwrap_or(-1);

            if stderr.contains("not a git repository") {
                return Err(GitError::NotARepository);
            }

            Err(GitError::CommandFailed { stderr, exit_code })
        }
    }

    /// Whether the index holds any staged change.
    fn has_staged_changes(&self) -> Result<bool, GitError> {
        // `diff --cached --quiet` exits 1 when the index differs from HEAD.
        let output = self
            .command()
            .args(["diff", "--cached", "--quiet"])
            .output()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    GitError::GitNotFound
                } else {
                    GitError::Io(e)
                }
            })?;

        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            code => Err(GitError::CommandFailed {
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: code.unwrap_or(-1),
            }),
        }
    }
}

impl Repository for GitRepository {
    fn commit(&mut self, paths: &[PathBuf], message: &str) -> Result<CommitOutcome, GitError> {
        let mut args: Vec<&str> = vec!["add", "--"];
        let rendered: Vec<String> = paths
            .iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
        args.extend(rendered.iter().map(String::as_str));
        self.run(&args)?;

        if !self.has_staged_changes()? {
            info!("nothing to commit, content is unchanged");
            return Ok(CommitOutcome::Skipped);
        }

        self.run(&["commit", "-m", message])?;
        let revision = Revision(self.run(&["rev-parse", "HEAD"])?.trim().to_owned());
        info!("recorded revision {revision}");
        Ok(CommitOutcome::Committed(revision))
    }

    fn push(&mut self) -> Result<(), GitError> {
        debug!("publishing to the remote…");
        match self.run(&["push"]) {
            Ok(_) => {
                info!("published to the remote");
                Ok(())
            }
            Err(GitError::CommandFailed { stderr, exit_code }) => {
                if is_rejection(&stderr) {
                    Err(GitError::PushRejected { stderr })
                } else {
                    Err(GitError::CommandFailed { stderr, exit_code })
                }
            }
            Err(err) => Err(err),
        }
    }
}

/// Whether push stderr indicates the remote refused the update.
fn is_rejection(stderr: &str) -> bool {
    stderr.contains("[rejected]")
        || stderr.contains("non-fast-forward")
        || stderr.contains("Authentication failed")
        || stderr.contains("could not read Username")
        || stderr.contains("Permission denied")
}
