use std::time::Duration;

use backoff::{backoff::Backoff, ExponentialBackoff, ExponentialBackoffBuilder};

/// How a failed page fetch is retried.
///
/// The user is asked before every retry. By default there is neither an attempt ceiling nor a
/// delay between a confirmed retry and the next request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Failed attempts after which the fetch gives up without asking.
    pub max_attempts: Option<u32>,
    pub backoff: Option<BackoffSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSettings {
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl RetryPolicy {
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff: None,
        }
    }

    pub fn with_backoff(mut self, initial_interval: Duration, max_interval: Duration) -> Self {
        self.backoff = Some(BackoffSettings {
            initial_interval,
            max_interval,
        });
        self
    }

    /// Fresh attempt bookkeeping for one page fetch.
    pub fn start(&self) -> RetryAttempts {
        RetryAttempts {
            failures: 0,
            max_attempts: self.max_attempts,
            backoff: self.backoff.as_ref().map(|settings| {
                ExponentialBackoffBuilder::new()
                    .with_initial_interval(settings.initial_interval)
                    .with_max_interval(settings.max_interval)
                    .with_randomization_factor(0.0)
                    .with_max_elapsed_time(None)
                    .build()
            }),
        }
    }
}

pub struct RetryAttempts {
    failures: u32,
    max_attempts: Option<u32>,
    backoff: Option<ExponentialBackoff>,
}

impl RetryAttempts {
    /// Records a failed attempt. Returns `false` once the ceiling is reached and the user should
    /// not be asked anymore.
    pub fn record_failure(&mut self) -> bool {
        self.failures += 1;
        self.max_attempts.map_or(true, |max_attempts| self.failures < max_attempts)
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Pause before the next confirmed retry.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.backoff.as_mut().and_then(Backoff::next_backoff)
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_none, assert_some_eq};

    use super::*;

    #[test]
    fn default_policy_never_gives_up() {
        let mut attempts = RetryPolicy::default().start();

        for _ in 0..1000 {
            assert!(attempts.record_failure());
        }
        assert_eq!(attempts.failures(), 1000);
        assert_none!(attempts.next_delay());
    }

    #[test]
    fn bounded_policy_stops_asking() {
        let mut attempts = RetryPolicy::bounded(3).start();

        assert!(attempts.record_failure());
        assert!(attempts.record_failure());
        assert!(!attempts.record_failure());
    }

    #[test]
    fn backoff_grows_up_to_the_cap() {
        let mut attempts = RetryPolicy::default()
            .with_backoff(Duration::from_millis(100), Duration::from_millis(250))
            .start();

        assert_some_eq!(attempts.next_delay(), Duration::from_millis(100));
        assert_some_eq!(attempts.next_delay(), Duration::from_millis(150));
        assert_some_eq!(attempts.next_delay(), Duration::from_millis(225));
        assert_some_eq!(attempts.next_delay(), Duration::from_millis(250));
    }
}
