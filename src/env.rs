//! Defines the environment variables to use.

use crate::static_lazy_lock;

use std::env;

use anyhow::Context as _;

/// Parses an environment variable from [`String`] to something else, wrapping any error in [`anyhow::Error`].
#[macro_export]
macro_rules! parse_env {
    ($key:expr => |$var:ident| $expr:expr) => {
        std::env::var($key)
            .map_err(|e| anyhow::anyhow!(e))
            .and_then(|$var| $expr)
    };
    ($key:expr => |$var:ident| $expr:expr; anyhow) => {
        parse_env!($key => |$var| $expr.map_err(|e| anyhow::anyhow!(e)))
    };
}

pub use parse_env;

static_lazy_lock! {
    /// The maximum retry limit for GitHub API requests within one run.
    pub MAX_RETRIES: u8 = parse_env!("MAX_RETRIES" => |s| s.parse::<u8>(); anyhow).unwrap_or(5);
}

/// The secrets one invocation runs with, scoped to that invocation.
///
/// Built explicitly from the environment and passed down as parameters so the
/// pipeline stays free of hidden global state.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// A fine-grained personal access token with read access to the account.
    pub access_token: String,
    /// The GitHub login the statistics are computed for.
    pub user_name: String,
}

impl Credentials {
    /// Reads the credentials from `ACCESS_TOKEN` and `USER_NAME`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the missing variable, before any network or
    /// version-control activity happens.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            access_token: env::var("ACCESS_TOKEN").context("ACCESS_TOKEN not set in environment")?,
            user_name: env::var("USER_NAME").context("USER_NAME not set in environment")?,
        })
    }
}
