use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::debug;

use crate::error::{SdkError, SdkResult};

/// Budget for a visibility wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(120_000),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Polls freshly fetched data until a condition holds or the budget runs out.
///
/// Fetch errors count as "not yet". Each attempt is cut off at the deadline.
/// Dropping the returned future abandons the wait.
#[derive(Clone, Copy, Debug, Default)]
pub struct VisibilityWaiter {
    options: WaitOptions,
}

impl VisibilityWaiter {
    pub fn new(options: WaitOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> WaitOptions {
        self.options
    }

    /// The same poll interval with a different timeout, if one is given.
    pub fn with_timeout(&self, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(timeout) => Self::new(WaitOptions {
                timeout,
                ..self.options
            }),
            None => *self,
        }
    }

    pub async fn wait<T, E, F, Fut, P>(&self, mut fetch: F, mut is_satisfied: P) -> SdkResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: FnMut(&T) -> bool,
    {
        let WaitOptions {
            timeout,
            poll_interval,
        } = self.options;
        let deadline = Instant::now() + timeout;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match timeout_at(deadline, fetch()).await {
                Ok(Ok(value)) if is_satisfied(&value) => {
                    debug!(attempts, "visibility condition met");
                    return Ok(value);
                }
                Ok(Ok(_)) => debug!(attempts, "visibility condition not met yet"),
                Ok(Err(e)) => debug!(attempts, error = %e, "fetch failed while waiting"),
                Err(_) => break,
            }
            sleep_until((Instant::now() + poll_interval).min(deadline)).await;
            if Instant::now() >= deadline {
                break;
            }
        }

        debug!(attempts, timeout_ms = timeout.as_millis() as u64, "visibility wait timed out");
        Err(SdkError::Timeout(timeout))
    }
}
