//! Exponential-backoff delivery around an [`UpdateTransport`].
//!
//! A push to one photo server is attempted up to [`RetryConfig::attempts`]
//! times, sleeping after each failure with doubling delays. With the
//! defaults (5 attempts, 4 s initial, 64 s cap) a server gets the full
//! backoff window of roughly two minutes before the caller gives up and
//! trips its breaker.

use std::time::Duration;

use lightbox_db::models::photo_server::PhotoServer;

use crate::commands::SetCommand;
use crate::transport::{TransportError, UpdateTransport};

/// Tunable parameters for delivery retries.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts per server before giving up.
    pub attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(64),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`RetryConfig::max_delay`].
pub fn next_delay(current: Duration, config: &RetryConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Deliver one command batch to one server, retrying with backoff.
///
/// Returns `Ok(())` on the first successful attempt, or the last attempt's
/// error once `config.attempts` have failed.
pub async fn deliver_with_retry(
    transport: &dyn UpdateTransport,
    server: &PhotoServer,
    commands: &[SetCommand],
    config: &RetryConfig,
) -> Result<(), TransportError> {
    let mut delay = config.initial_delay;
    let mut last_err: Option<TransportError> = None;

    for attempt in 1..=config.attempts {
        match transport.send_commands(server, commands).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(
                    attempt,
                    server_id = server.id,
                    subdomain = %server.subdomain,
                    url = %server.photos_update_url,
                    error = %e,
                    "Photo server delivery attempt failed"
                );
                last_err = Some(e);
            }
        }
        tokio::time::sleep(delay).await;
        delay = next_delay(delay, config);
    }

    match last_err {
        Some(e) => Err(e),
        // attempts == 0 means delivery was never tried; report it as a
        // refused push rather than a silent success.
        None => Err(TransportError::HttpStatus(0)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;

    fn test_server() -> PhotoServer {
        PhotoServer {
            id: 1,
            subdomain: "photos01".to_string(),
            photos_update_url: "http://localhost/update".to_string(),
            auth_key: "secret".to_string(),
            date_registered: Utc::now(),
            unreachable: false,
        }
    }

    fn fast_config(attempts: u32) -> RetryConfig {
        RetryConfig {
            attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            multiplier: 2.0,
        }
    }

    /// Fails the first `failures` calls, then succeeds.
    struct FlakyTransport {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl UpdateTransport for FlakyTransport {
        async fn send_commands(
            &self,
            _server: &PhotoServer,
            _commands: &[SetCommand],
        ) -> Result<(), TransportError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(TransportError::HttpStatus(500))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn next_delay_doubles() {
        let config = RetryConfig::default();
        let d = next_delay(Duration::from_secs(4), &config);
        assert_eq!(d, Duration::from_secs(8));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let config = RetryConfig::default();
        let d = next_delay(Duration::from_secs(64), &config);
        assert_eq!(d, Duration::from_secs(64));
    }

    #[test]
    fn default_schedule_is_four_through_sixty_four_seconds() {
        let config = RetryConfig::default();
        let mut delay = config.initial_delay;
        let mut schedule = vec![delay];
        for _ in 1..config.attempts {
            delay = next_delay(delay, &config);
            schedule.push(delay);
        }
        let secs: Vec<u64> = schedule.iter().map(|d| d.as_secs()).collect();
        assert_eq!(secs, vec![4, 8, 16, 32, 64]);
    }

    #[tokio::test]
    async fn succeeds_on_first_attempt() {
        let transport = FlakyTransport { failures: 0, calls: AtomicU32::new(0) };
        let commands = vec![SetCommand::set("a", "1")];

        let result =
            deliver_with_retry(&transport, &test_server(), &commands, &fast_config(5)).await;

        assert!(result.is_ok());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let transport = FlakyTransport { failures: 2, calls: AtomicU32::new(0) };
        let commands = vec![SetCommand::set("a", "1")];

        let result =
            deliver_with_retry(&transport, &test_server(), &commands, &fast_config(5)).await;

        assert!(result.is_ok());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_configured_attempts() {
        let transport = FlakyTransport { failures: u32::MAX, calls: AtomicU32::new(0) };
        let commands = vec![SetCommand::set("a", "1")];

        let result =
            deliver_with_retry(&transport, &test_server(), &commands, &fast_config(5)).await;

        assert!(result.is_err());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 5);
    }
}
