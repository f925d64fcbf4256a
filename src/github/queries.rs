//! GraphQL documents and their typed responses.
//!
//! Every document here targets GitHub's GraphQL v4 API. The deserialization
//! types mirror the exact shape each query selects, nothing more.

use serde::Deserialize;

/// A repository affiliation filter accepted by the `repositories` connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affiliation {
    Owner,
    Collaborator,
    OrganizationMember,
}

impl Affiliation {
    /// Repositories owned by the account.
    pub const OWNED: &[Self] = &[Self::Owner];
    /// Every repository the account has contributed to.
    pub const CONTRIBUTED: &[Self] = &[Self::Owner, Self::Collaborator, Self::OrganizationMember];

    /// The wire value GitHub expects for this affiliation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Collaborator => "COLLABORATOR",
            Self::OrganizationMember => "ORGANIZATION_MEMBER",
        }
    }
}

/// Converts affiliations to the JSON list a query variable wants.
pub fn affiliation_values(affiliations: &[Affiliation]) -> Vec<&'static str> {
    affiliations.iter().map(|a| a.as_str()).collect()
}

/// Resolves the account id and creation date for a login.
pub const ACCOUNT: &str = "
query($login: String!) {
    user(login: $login) {
        id
        createdAt
    }
}";

/// Resolves the follower count for a login.
pub const FOLLOWERS: &str = "
query($login: String!) {
    user(login: $login) {
        followers {
            totalCount
        }
    }
}";

/// One page of repositories with their star counts.
pub const REPOSITORIES: &str = "
query($owner_affiliation: [RepositoryAffiliation], $login: String!, $cursor: String) {
    user(login: $login) {
        repositories(first: 100, after: $cursor, ownerAffiliations: $owner_affiliation) {
            totalCount
            edges {
                node {
                    ... on Repository {
                        nameWithOwner
                        stargazers {
                            totalCount
                        }
                    }
                }
            }
            pageInfo {
                endCursor
                hasNextPage
            }
        }
    }
}";

/// One page of repositories with their default-branch commit totals.
///
/// Pages of 60: larger pages time out against the API, smaller ones need too
/// many round trips.
pub const LOC_OVERVIEW: &str = "
query($owner_affiliation: [RepositoryAffiliation], $login: String!, $cursor: String) {
    user(login: $login) {
        repositories(first: 60, after: $cursor, ownerAffiliations: $owner_affiliation) {
            edges {
                node {
                    ... on Repository {
                        nameWithOwner
                        defaultBranchRef {
                            target {
                                ... on Commit {
                                    history {
                                        totalCount
                                    }
                                }
                            }
                        }
                    }
                }
            }
            pageInfo {
                endCursor
                hasNextPage
            }
        }
    }
}";

/// One page of a repository's default-branch history with line deltas.
pub const REPOSITORY_HISTORY: &str = "
query($repo_name: String!, $owner: String!, $cursor: String) {
    repository(name: $repo_name, owner: $owner) {
        defaultBranchRef {
            target {
                ... on Commit {
                    history(first: 100, after: $cursor) {
                        totalCount
                        edges {
                            node {
                                ... on Commit {
                                    additions
                                    deletions
                                    author {
                                        user {
                                            id
                                        }
                                    }
                                }
                            }
                        }
                        pageInfo {
                            endCursor
                            hasNextPage
                        }
                    }
                }
            }
        }
    }
}";

#[derive(Debug, Deserialize, Clone)]
pub struct TotalCount {
    #[serde(rename = "totalCount")]
    pub total_count: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccountData {
    pub user: Option<Account>,
}

/// The account the statistics are computed for.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FollowerData {
    pub user: Option<FollowerUser>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FollowerUser {
    pub followers: TotalCount,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepositoryData {
    pub user: Option<RepositoryUser>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepositoryUser {
    pub repositories: RepositoryPage,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryPage {
    pub total_count: u64,
    pub edges: Vec<RepositoryEdge>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepositoryEdge {
    pub node: RepositoryNode,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub name_with_owner: String,
    pub stargazers: TotalCount,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocOverviewData {
    pub user: Option<LocOverviewUser>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocOverviewUser {
    pub repositories: LocOverviewPage,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LocOverviewPage {
    pub edges: Vec<LocOverviewEdge>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocOverviewEdge {
    pub node: LocOverviewNode,
}

/// A repository paired with its default-branch commit total.
///
/// `default_branch_ref` is [`None`] for empty repositories.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LocOverviewNode {
    pub name_with_owner: String,
    pub default_branch_ref: Option<BranchRef>,
}

impl LocOverviewNode {
    /// The commit total on the default branch, zero when the repository is empty.
    pub fn commit_total(&self) -> u64 {
        self.default_branch_ref
            .as_ref()
            .and_then(|branch| branch.target.as_ref())
            .map_or(0, |target| target.history.total_count)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BranchRef {
    pub target: Option<CommitTarget>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommitTarget {
    pub history: TotalCount,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryData {
    pub repository: Option<HistoryRepository>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRepository {
    pub default_branch_ref: Option<HistoryBranchRef>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryBranchRef {
    pub target: Option<HistoryTarget>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryTarget {
    pub history: CommitHistory,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommitHistory {
    pub total_count: u64,
    pub edges: Vec<CommitEdge>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommitEdge {
    pub node: CommitNode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommitNode {
    pub additions: i64,
    pub deletions: i64,
    pub author: CommitAuthor,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommitAuthor {
    pub user: Option<AuthorId>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthorId {
    pub id: String,
}
