//! Backoff between attempts of a retryable request.

use std::time::Duration;

use rand::Rng;

/// How many times to resend a request and how long to wait in between.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Upper bound for computed backoff delays.
    pub max_delay: Duration,
    pub backoff: BackoffStrategy,
    /// Upper bound for a server-supplied `Retry-After`.
    pub max_retry_after: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff: BackoffStrategy::ExponentialWithJitter { factor: 2.0 },
            max_retry_after: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64();
        let secs = match self.backoff {
            BackoffStrategy::Constant => base,
            BackoffStrategy::Exponential { factor } => base * factor.powi(attempt as i32),
            BackoffStrategy::ExponentialWithJitter { factor } => {
                let exp = base * factor.powi(attempt as i32);
                exp + rand::rng().random::<f64>() * exp
            }
        };
        Duration::from_secs_f64(secs).min(self.max_delay)
    }
}

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy)]
pub enum BackoffStrategy {
    Constant,
    /// `initial * factor^attempt`
    Exponential { factor: f64 },
    /// Exponential plus up to the same amount again at random.
    ExponentialWithJitter { factor: f64 },
}

/// Attempt counter for one logical request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    attempt: u32,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Retries used so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Count one retry and return how long to sleep before it, or `None`
    /// when the budget is spent. A `Retry-After` hint wins over backoff.
    pub fn next_delay(&mut self, retry_after: Option<Duration>) -> Option<Duration> {
        if self.attempt >= self.config.max_attempts {
            return None;
        }

        let delay = match retry_after {
            Some(hint) => hint.min(self.config.max_retry_after),
            None => self.config.backoff_delay(self.attempt),
        };
        self.attempt += 1;
        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_retry_gives_no_delay() {
        let mut policy = RetryPolicy::new(RetryConfig::no_retry());
        assert_eq!(policy.next_delay(None), None);
        assert_eq!(policy.attempt(), 0);
    }

    #[test]
    fn test_exponential_delays_are_capped() {
        let mut policy = RetryPolicy::new(
            RetryConfig::default()
                .with_max_attempts(10)
                .with_initial_delay(Duration::from_secs(1))
                .with_backoff(BackoffStrategy::Exponential { factor: 2.0 }),
        );

        let delays: Vec<Duration> = std::iter::from_fn(|| policy.next_delay(None)).collect();
        assert_eq!(delays.len(), 10);
        assert_eq!(delays[0], Duration::from_secs(1));
        assert_eq!(delays[3], Duration::from_secs(8));
        assert_eq!(delays[9], Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_stays_within_one_extra_step() {
        let config = RetryConfig::default().with_initial_delay(Duration::from_secs(1));
        let delay = config.backoff_delay(1);
        assert!(delay >= Duration::from_secs(2));
        assert!(delay <= Duration::from_secs(4));
    }

    #[test]
    fn test_constant_policy_exhausts() {
        let mut policy = RetryPolicy::new(
            RetryConfig::default()
                .with_max_attempts(2)
                .with_backoff(BackoffStrategy::Constant),
        );

        assert_eq!(policy.next_delay(None), Some(Duration::from_millis(500)));
        assert_eq!(policy.next_delay(None), Some(Duration::from_millis(500)));
        assert_eq!(policy.attempt(), 2);
        assert!(policy.next_delay(None).is_none());
    }

    #[test]
    fn test_retry_after_hint_is_capped() {
        let mut policy = RetryPolicy::new(RetryConfig::default());
        assert_eq!(
            policy.next_delay(Some(Duration::from_secs(30))),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            policy.next_delay(Some(Duration::from_secs(600))),
            Some(Duration::from_secs(60))
        );
    }
}
