//! The per-user lines-of-code cache.
//!
//! Counting lines requires walking every commit of every repository, which is
//! far too expensive to do on each run. The cache keeps one line per
//! repository so only repositories whose commit total changed get recounted.
//!
//! File layout: a fixed-size comment block, then one line per repository in
//! the form `<sha256(name_with_owner)> <commit_count> <my_commits> <additions>
//! <deletions>`. Repository names are hashed so the cache leaks nothing about
//! private repositories. Every write goes through a temp file and an atomic
//! rename so a crash never leaves a half-written cache behind.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use sha2::{Digest as _, Sha256};
use tracing::{debug, info};

/// The number of free-form comment lines kept at the top of the cache file.
pub const COMMENT_LINES: usize = 7;

const COMMENT_PLACEHOLDER: &str = "This line is a comment block. Write whatever you want here.";

/// The hex digest used as a cache key for a repository or a user.
pub fn digest(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// One cached repository: its key and the numbers last computed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub repo_hash: String,
    pub commit_count: u64,
    pub my_commits: u64,
    pub additions: i64,
    pub deletions: i64,
}

impl CacheEntry {
    fn zeroed(repo_hash: String) -> Self {
        Self {
            repo_hash,
            commit_count: 0,
            my_commits: 0,
            additions: 0,
            deletions: 0,
        }
    }

    fn parse(line: &str) -> io::Result<Self> {
        let mut fields = line.split_whitespace();
        let mut next = |name: &str| {
            fields.next().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("cache line missing the {name} field"),
                )
            })
        };
        let parse_err = |e: std::num::ParseIntError| io::Error::new(io::ErrorKind::InvalidData, e);

        Ok(Self {
            repo_hash: next("repository hash")?.to_owned(),
            commit_count: next("commit count")?.parse().map_err(parse_err)?,
            my_commits: next("own commit count")?.parse().map_err(parse_err)?,
            additions: next("additions")?.parse().map_err(parse_err)?,
            deletions: next("deletions")?.parse().map_err(parse_err)?,
        })
    }
}

/// The cache file for one user, loaded into memory.
#[derive(Debug)]
pub struct LocCache {
    path: PathBuf,
    comment: Vec<String>,
    entries: Vec<CacheEntry>,
}

impl LocCache {
    /// Opens the cache for a user, creating an empty one if none exists.
    ///
    /// The file lives at `<dir>/<sha256(user_name)>.txt`.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors or when an existing cache line does not parse.
    pub fn open(dir: &Path, user_name: &str) -> io::Result<Self> {
        let path = dir.join(format!("{}.txt", digest(user_name)));

        let mut cache = match fs::read_to_string(&path) {
            Ok(content) => {
                let lines: Vec<&str> = content.lines().collect();
                let comment = lines
                    .iter()
                    .take(COMMENT_LINES)
                    .map(|line| (*line).to_owned())
                    .collect();
                let entries = lines
                    .iter()
                    .skip(COMMENT_LINES)
                    .map(|line| CacheEntry::parse(line))
                    .collect::<io::Result<_>>()?;
                Self {
                    path,
                    comment,
                    entries,
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("cache file {path:?} not found, creating it");
                Self {
                    path,
                    comment: vec![COMMENT_PLACEHOLDER.to_owned(); COMMENT_LINES],
                    entries: Vec::new(),
                }
            }
            Err(err) => return Err(err),
        };

        if !cache.path.exists() {
            cache.save()?;
        }
        Ok(cache)
    }

    /// Aligns the cached entries with the current repository set.
    ///
    /// When the set of repositories changed (or `force` is set) the entries
    /// are rebuilt zeroed, which makes every repository due for a recount.
    /// Returns whether the existing entries were kept.
    ///
    /// # Errors
    ///
    /// Fails when persisting a rebuilt cache fails.
    pub fn reconcile(&mut self, repo_hashes: &[String], force: bool) -> io::Result<bool> {
        if self.entries.len() == repo_hashes.len() && !force {
            return Ok(true);
        }

        info!(
            "rebuilding lines-of-code cache ({} entries cached, {} repositories live)",
            self.entries.len(),
            repo_hashes.len()
        );
        self.entries = repo_hashes
            .iter()
            .map(|hash| CacheEntry::zeroed(hash.clone()))
            .collect();
        self.save()?;
        Ok(false)
    }

    /// The cached entries, in repository order.
    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    /// Mutable access to one entry for updating after a recount.
    pub fn entry_mut(&mut self, index: usize) -> Option<&mut CacheEntry> {
        self.entries.get_mut(index)
    }

    /// Total additions and deletions across all cached repositories.
    pub fn loc_totals(&self) -> (i64, i64) {
        self.entries
            .iter()
            .fold((0, 0), |(add, del), entry| {
                (add + entry.additions, del + entry.deletions)
            })
    }

    /// Total commits authored by the user across all cached repositories.
    pub fn commit_total(&self) -> u64 {
        self.entries.iter().map(|entry| entry.my_commits).sum()
    }

    /// Persists the cache atomically (temp file, then rename).
    ///
    /// # Errors
    ///
    /// Fails on I/O errors while writing or renaming.
    pub fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("txt.tmp");
        let mut tmp = fs::File::create(&tmp_path)?;
        for line in &self.comment {
            writeln!(tmp, "{line}")?;
        }
        for entry in &self.entries {
            writeln!(
                tmp,
                "{} {} {} {} {}",
                entry.repo_hash,
                entry.commit_count,
                entry.my_commits,
                entry.additions,
                entry.deletions
            )?;
        }
        tmp.sync_all()?;
        drop(tmp);
        fs::rename(&tmp_path, &self.path)
    }
}
