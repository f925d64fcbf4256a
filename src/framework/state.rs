use std::time::Duration;

use tracing::{error, warn};

use crate::env::MAX_RETRIES;

/// A state that controls the flow of data.
#[non_exhaustive]
#[derive(Debug, PartialEq, Eq)]
pub enum State<T> {
    /// The control flow should exit with a value.
    Success(T),
    /// The control flow should retry if possible.
    ///
    /// See: [retry_if_possible]
    Retry,
    /// The control flow should exit immediately.
    Stop,
}

/// Decides whether retrying is allowed based on a provided retry times and the [`MAX_RETRIES`] environment variable.
///
/// # Errors
///
/// Returns [`Err<()>`] if retrying is not allowed, otherwise [`Ok<()>`] is returned.
pub fn retry_if_possible(retry: &mut u8) -> Result<(), ()> {
    *retry += 1;
    if *retry > *MAX_RETRIES {
        error!("retried for too many times ({}), stopping!", *MAX_RETRIES);
        Err(())
    } else {
        warn!("retrying… ({retry} / {})", *MAX_RETRIES);
        Ok(())
    }
}

/// The delay to wait before the given retry attempt, doubling from a 500 ms base.
///
/// Transient GitHub API failures (502s in particular) usually clear within a
/// few seconds, so the backoff stays short.
pub fn backoff_delay(retry: u8) -> Duration {
    Duration::from_millis(500 * 2u64.pow(u32::from(retry.saturating_sub(1))))
}
