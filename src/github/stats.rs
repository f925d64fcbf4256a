//! High-level statistics fetchers and the production content generator.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use serde_json::json;
use tracing::{debug, info};

use crate::cache::LocCache;
use crate::env::Credentials;
use crate::github::loc::update_cache;
use crate::github::queries::{
    self, Account, Affiliation, LocOverviewNode, affiliation_values,
};
use crate::github::{GenerationError, GitHubClient, QueryKind};
use crate::pipeline::Generator;
use crate::stats::{ProfileStats, age_since};
use crate::svg;

/// Resolves the account behind a login.
///
/// # Errors
///
/// Fails when the login does not resolve to a user.
pub async fn account(
    client: &GitHubClient,
    credentials: &Credentials,
) -> Result<Account, GenerationError> {
    let data: queries::AccountData = client
        .post_with_retry(
            QueryKind::Account,
            credentials,
            queries::ACCOUNT,
            json!({ "login": credentials.user_name }),
        )
        .await?;
    data.user.ok_or(GenerationError::MissingData("user account"))
}

/// The follower count for the login.
pub async fn follower_count(
    client: &GitHubClient,
    credentials: &Credentials,
) -> Result<u64, GenerationError> {
    let data: queries::FollowerData = client
        .post_with_retry(
            QueryKind::Followers,
            credentials,
            queries::FOLLOWERS,
            json!({ "login": credentials.user_name }),
        )
        .await?;
    Ok(data
        .user
        .ok_or(GenerationError::MissingData("follower count"))?
        .followers
        .total_count)
}

/// Repository count and total stars for the given affiliations, paginated.
pub async fn repos_and_stars(
    client: &GitHubClient,
    credentials: &Credentials,
    affiliations: &[Affiliation],
) -> Result<(u64, u64), GenerationError> {
    let mut stars: u64 = 0;
    let mut cursor: Option<String> = None;

    loop {
        let data: queries::RepositoryData = client
            .post_with_retry(
                QueryKind::Repositories,
                credentials,
                queries::REPOSITORIES,
                json!({
                    "owner_affiliation": affiliation_values(affiliations),
                    "login": credentials.user_name,
                    "cursor": cursor,
                }),
            )
            .await?;
        let page = data
            .user
            .ok_or(GenerationError::MissingData("repositories"))?
            .repositories;

        stars += page
            .edges
            .iter()
            .map(|edge| edge.node.stargazers.total_count)
            .sum::<u64>();

        if !page.page_info.has_next_page {
            return Ok((page.total_count, stars));
        }
        cursor = page.page_info.end_cursor;
    }
}

/// The repository count alone; one page carries the connection total.
pub async fn repo_count(
    client: &GitHubClient,
    credentials: &Credentials,
    affiliations: &[Affiliation],
) -> Result<u64, GenerationError> {
    let data: queries::RepositoryData = client
        .post_with_retry(
            QueryKind::Repositories,
            credentials,
            queries::REPOSITORIES,
            json!({
                "owner_affiliation": affiliation_values(affiliations),
                "login": credentials.user_name,
                "cursor": Option::<String>::None,
            }),
        )
        .await?;
    Ok(data
        .user
        .ok_or(GenerationError::MissingData("repository count"))?
        .repositories
        .total_count)
}

/// Every repository visible under the given affiliations, with commit totals.
pub async fn loc_overview(
    client: &GitHubClient,
    credentials: &Credentials,
    affiliations: &[Affiliation],
) -> Result<Vec<LocOverviewNode>, GenerationError> {
    let mut nodes = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let data: queries::LocOverviewData = client
            .post_with_retry(
                QueryKind::LocOverview,
                credentials,
                queries::LOC_OVERVIEW,
                json!({
                    "owner_affiliation": affiliation_values(affiliations),
                    "login": credentials.user_name,
                    "cursor": cursor,
                }),
            )
            .await?;
        let page = data
            .user
            .ok_or(GenerationError::MissingData("repository overview"))?
            .repositories;

        nodes.extend(page.edges.into_iter().map(|edge| edge.node));
        if !page.page_info.has_next_page {
            return Ok(nodes);
        }
        cursor = page.page_info.end_cursor;
    }
}

/// The production [`Generator`]: fetches the statistics and rewrites the
/// SVG templates on disk.
#[derive(Debug)]
pub struct ProfileGenerator {
    client: GitHubClient,
    /// Birth date rendered into the age field.
    birthday: NaiveDate,
    /// Directory holding the lines-of-code cache.
    cache_dir: PathBuf,
    /// The SVG templates to rewrite.
    templates: Vec<PathBuf>,
    /// Rebuild the lines-of-code cache from scratch.
    force_cache: bool,
}

impl ProfileGenerator {
    pub fn new(
        client: GitHubClient,
        birthday: NaiveDate,
        cache_dir: PathBuf,
        templates: Vec<PathBuf>,
        force_cache: bool,
    ) -> Self {
        Self {
            client,
            birthday,
            cache_dir,
            templates,
            force_cache,
        }
    }

    /// Fetches everything one run renders.
    ///
    /// # Errors
    ///
    /// Propagates the first fatal API or cache failure.
    pub async fn collect(&self, credentials: &Credentials) -> Result<ProfileStats, GenerationError> {
        let step = Instant::now();
        let account = account(&self.client, credentials).await?;
        debug!("account data fetched in {:?}", step.elapsed());

        let age = age_since(self.birthday, Local::now().date_naive());

        let step = Instant::now();
        let overview = loc_overview(&self.client, credentials, Affiliation::CONTRIBUTED).await?;
        let mut cache = LocCache::open(&self.cache_dir, &credentials.user_name)?;
        let loc = update_cache(
            &self.client,
            credentials,
            &mut cache,
            &overview,
            &account.id,
            self.force_cache,
        )
        .await?;
        debug!("lines of code counted in {:?}", step.elapsed());

        let commits = cache.commit_total();

        let step = Instant::now();
        let (repos, stars) = repos_and_stars(&self.client, credentials, Affiliation::OWNED).await?;
        let contributed = repo_count(&self.client, credentials, Affiliation::CONTRIBUTED).await?;
        let followers = follower_count(&self.client, credentials).await?;
        debug!("counts fetched in {:?}", step.elapsed());

        Ok(ProfileStats {
            age,
            commits,
            stars,
            repos,
            contributed,
            followers,
            loc,
        })
    }

    /// Rewrites every configured template with the given statistics.
    ///
    /// # Errors
    ///
    /// Fails on template I/O errors.
    pub fn render(&self, stats: &ProfileStats) -> Result<(), GenerationError> {
        for template in &self.templates {
            svg::overwrite(template, stats)?;
        }
        Ok(())
    }
}

impl Generator for ProfileGenerator {
    fn generate(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<(), GenerationError>> {
        async move {
            let started = Instant::now();
            let stats = self.collect(credentials).await?;
            info!(
                "statistics for {} collected in {:?}: {} commits, {} stars, {} repositories, {} followers",
                credentials.user_name,
                started.elapsed(),
                stats.commits,
                stats.stars,
                stats.repos,
                stats.followers
            );
            self.render(&stats)?;
            self.client.log_query_counts();
            Ok(())
        }
    }
}
