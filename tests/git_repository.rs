//! Integration tests for the git-backed repository collaborator, run against
//! real temporary repositories.

#[path = "common/mod.rs"]
#[macro_use]
mod common;

use std::path::PathBuf;

use common::{RemoteRepo, TestRepo};
use profile_refresh::git::{CommitOutcome, GitError, GitRepository, Repository as _};

#[test]
fn commit_records_changed_files() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    repo.write_file("stats.txt", "42 commits\n");

    let mut git = GitRepository::with_repo_path(repo.path());
    let outcome = git
        .commit(&[PathBuf::from("stats.txt")], "Update profile statistics")
        .expect("commit should succeed");

    match outcome {
        CommitOutcome::Committed(revision) => {
            assert_eq!(revision.0.len(), 40, "expected a full commit hash");
        }
        CommitOutcome::Skipped => panic!("expected a revision for changed content"),
    }
}

#[test]
fn unchanged_content_is_skipped_not_an_error() {
    skip_if_no_git!();
    let repo = TestRepo::new();
    repo.write_file("stats.txt", "42 commits\n");

    let mut git = GitRepository::with_repo_path(repo.path());
    git.commit(&[PathBuf::from("stats.txt")], "Update profile statistics")
        .expect("first commit should succeed");

    // Second run with identical content.
    let outcome = git
        .commit(&[PathBuf::from("stats.txt")], "Update profile statistics")
        .expect("second commit should succeed");
    assert_eq!(outcome, CommitOutcome::Skipped);
}

#[test]
fn push_publishes_the_revision_to_the_remote() {
    skip_if_no_git!();
    let remote = RemoteRepo::new();
    let repo = TestRepo::new();
    repo.git(&["remote", "add", "origin", &remote.url()]);
    repo.git(&["push", "-u", "origin", "main"]);

    repo.write_file("stats.txt", "42 commits\n");
    let mut git = GitRepository::with_repo_path(repo.path());
    let outcome = git
        .commit(&[PathBuf::from("stats.txt")], "Update profile statistics")
        .expect("commit should succeed");
    git.push().expect("push should succeed");

    match outcome {
        CommitOutcome::Committed(revision) => assert_eq!(remote.head(), revision.0),
        CommitOutcome::Skipped => panic!("expected a revision"),
    }
}

#[test]
fn concurrent_publisher_wins_and_the_loser_is_rejected() {
    skip_if_no_git!();
    let remote = RemoteRepo::new();
    let first = TestRepo::new();
    first.git(&["remote", "add", "origin", &remote.url()]);
    first.git(&["push", "-u", "origin", "main"]);

    // A second invocation starts from the same remote state.
    let second = TestRepo::clone_from(&remote.url());

    // The first invocation publishes.
    first.write_file("stats.txt", "first\n");
    let mut first_git = GitRepository::with_repo_path(first.path());
    first_git
        .commit(&[PathBuf::from("stats.txt")], "Update profile statistics")
        .expect("commit should succeed");
    first_git.push().expect("push should succeed");

    // The second invocation is now stale; its publish must be rejected.
    second.write_file("stats.txt", "second\n");
    let mut second_git = GitRepository::with_repo_path(second.path());
    second_git
        .commit(&[PathBuf::from("stats.txt")], "Update profile statistics")
        .expect("commit should succeed");

    let error = second_git.push().expect_err("push should be rejected");
    assert!(matches!(error, GitError::PushRejected { .. }), "got {error:?}");
}

#[test]
fn operations_outside_a_repository_are_reported() {
    skip_if_no_git!();
    let dir = tempfile::TempDir::new().unwrap();

    let mut git = GitRepository::with_repo_path(dir.path().to_path_buf());
    let error = git
        .commit(&[PathBuf::from("stats.txt")], "Update profile statistics")
        .expect_err("commit should fail outside a repository");
    assert!(matches!(error, GitError::NotARepository), "got {error:?}");
}
