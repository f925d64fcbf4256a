//! Lines-of-code counting over commit history.
//!
//! GitHub only serves 100 commits per page, so a recount walks a repository's
//! default branch with cursor pagination and sums the line deltas of commits
//! authored by the account owner.

use serde_json::json;
use tracing::{debug, info, warn};

use crate::cache::{self, LocCache};
use crate::env::Credentials;
use crate::github::queries::{self, LocOverviewNode};
use crate::github::{GenerationError, GitHubClient, QueryKind};
use crate::stats::LocTotals;

/// The numbers a full history walk produces for one repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoLoc {
    pub additions: i64,
    pub deletions: i64,
    pub my_commits: u64,
}

/// Walks a repository's default-branch history and sums the owner's line deltas.
///
/// # Errors
///
/// Propagates client failures; an empty repository yields all zeros.
pub async fn count_repo_loc(
    client: &GitHubClient,
    credentials: &Credentials,
    owner: &str,
    repo_name: &str,
    owner_id: &str,
) -> Result<RepoLoc, GenerationError> {
    let mut totals = RepoLoc::default();
    let mut cursor: Option<String> = None;

    loop {
        let data: queries::HistoryData = client
            .post_with_retry(
                QueryKind::RepositoryHistory,
                credentials,
                queries::REPOSITORY_HISTORY,
                json!({ "repo_name": repo_name, "owner": owner, "cursor": cursor }),
            )
            .await?;

        let Some(target) = data
            .repository
            .and_then(|repository| repository.default_branch_ref)
            .and_then(|branch| branch.target)
        else {
            // Empty repository: nothing to count.
            return Ok(RepoLoc::default());
        };

        for edge in &target.history.edges {
            let authored_by_owner = edge
                .node
                .author
                .user
                .as_ref()
                .is_some_and(|user| user.id == owner_id);
            if authored_by_owner {
                totals.my_commits += 1;
                totals.additions += edge.node.additions;
                totals.deletions += edge.node.deletions;
            }
        }

        if !target.history.page_info.has_next_page {
            return Ok(totals);
        }
        cursor = target.history.page_info.end_cursor;
    }
}

/// Brings the cache in line with the live repository set and recounts every
/// repository whose commit total changed.
///
/// On a failure mid-recount the progress made so far is persisted before the
/// error propagates, so the next run resumes instead of starting over.
///
/// # Errors
///
/// Propagates client and cache I/O failures.
pub async fn update_cache(
    client: &GitHubClient,
    credentials: &Credentials,
    cache: &mut LocCache,
    repositories: &[LocOverviewNode],
    owner_id: &str,
    force: bool,
) -> Result<LocTotals, GenerationError> {
    let repo_hashes: Vec<String> = repositories
        .iter()
        .map(|repo| cache::digest(&repo.name_with_owner))
        .collect();
    let from_cache = cache.reconcile(&repo_hashes, force)?;

    for (index, repo) in repositories.iter().enumerate() {
        let Some(entry) = cache.entry_mut(index) else {
            break;
        };
        if entry.repo_hash != repo_hash_at(&repo_hashes, index) {
            warn!(
                "cache entry {index} does not match repository {}, skipping it",
                repo.name_with_owner
            );
            continue;
        }
        if entry.commit_count == repo.commit_total() {
            continue;
        }

        debug!("recounting lines of {}…", repo.name_with_owner);
        let Some((owner, repo_name)) = repo.name_with_owner.split_once('/') else {
            warn!("malformed repository name {}", repo.name_with_owner);
            continue;
        };

        let counted = match count_repo_loc(client, credentials, owner, repo_name, owner_id).await {
            Ok(counted) => counted,
            Err(err) => {
                // Keep the partial progress; the next run picks up from here.
                cache.save()?;
                return Err(err);
            }
        };

        if let Some(entry) = cache.entry_mut(index) {
            entry.commit_count = repo.commit_total();
            entry.my_commits = counted.my_commits;
            entry.additions = counted.additions;
            entry.deletions = counted.deletions;
        }
    }
    cache.save()?;

    let (added, deleted) = cache.loc_totals();
    info!(
        "lines of code: +{added} -{deleted} across {} repositories (cache {})",
        repositories.len(),
        if from_cache { "hit" } else { "rebuilt" }
    );
    Ok(LocTotals {
        added,
        deleted,
        from_cache,
    })
}

fn repo_hash_at(hashes: &[String], index: usize) -> &str {
    hashes.get(index).map_or("", String::as_str)
}
