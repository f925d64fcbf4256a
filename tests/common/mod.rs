//! Common test utilities for integration tests.
//!
//! Note: each integration test file compiles as a separate crate, so not all
//! helpers are used in every test file.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

/// Skips the current test when no `git` binary is available.
#[macro_export]
macro_rules! skip_if_no_git {
    () => {
        if !$crate::common::git_available() {
            eprintln!("git not found in PATH, skipping test");
            return;
        }
    };
}

/// Whether a `git` binary is reachable.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// A temporary git repository with an identity configured and one initial
/// revision recorded, torn down on drop.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Creates a repository with an initial revision on `main`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp directory");
        let repo = Self { dir };

        repo.git(&["init", "-b", "main"]);
        repo.git(&["config", "user.name", "Test Runner"]);
        repo.git(&["config", "user.email", "runner@example.com"]);
        repo.write_file("README.md", "initial\n");
        repo.git(&["add", "README.md"]);
        repo.git(&["commit", "-m", "initial"]);
        repo
    }

    /// Clones an existing repository (sharing its remote history).
    pub fn clone_from(url: &str) -> Self {
        let dir = TempDir::new().expect("failed to create temp directory");
        let output = Command::new("git")
            .args(["clone", url, "."])
            .current_dir(dir.path())
            .output()
            .expect("failed to execute git clone");
        assert!(
            output.status.success(),
            "git clone failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let repo = Self { dir };
        repo.git(&["config", "user.name", "Test Runner"]);
        repo.git(&["config", "user.email", "runner@example.com"]);
        repo
    }

    /// The path to the repository root.
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Runs a git command in this repository, panicking on failure.
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .expect("failed to execute git command");

        assert!(
            output.status.success(),
            "git {:?} failed with exit code {:?}:\n{}",
            args,
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Writes a file in the repository.
    pub fn write_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent directories");
        }
        std::fs::write(&path, content).expect("failed to write file");
    }
}

/// A bare repository serving as the remote for [`TestRepo`]s.
pub struct RemoteRepo {
    dir: TempDir,
}

impl RemoteRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp directory");
        let output = Command::new("git")
            .args(["init", "--bare", "-b", "main"])
            .current_dir(dir.path())
            .output()
            .expect("failed to execute git init --bare");
        assert!(output.status.success());
        Self { dir }
    }

    /// The URL work repositories push to.
    pub fn url(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    /// The revision `main` points at on the remote.
    pub fn head(&self) -> String {
        let output = Command::new("git")
            .args(["rev-parse", "main"])
            .current_dir(self.dir.path())
            .output()
            .expect("failed to execute git rev-parse");
        assert!(output.status.success());
        String::from_utf8_lossy(&output.stdout).trim().to_owned()
    }
}
