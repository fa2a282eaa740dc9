//! Bounded retry with exponential backoff for availability API calls.
//!
//! The retry policy is a small state machine (attempt count, next delay) so it
//! can be exercised without any network.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Result, ScanError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: u32,
    /// Delay after the first failure; doubles each time
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn start(&self) -> RetryState {
        RetryState {
            attempt: 1,
            next_delay: self.base_delay,
            max_attempts: self.max_attempts,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            crate::constants::upstream::RETRY_ATTEMPTS,
            Duration::from_millis(crate::constants::upstream::RETRY_BASE_DELAY_MS),
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RetryState {
    attempt: u32,
    next_delay: Duration,
    max_attempts: u32,
}

impl RetryState {
    /// 1-based number of the attempt in progress
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a transient failure. Returns the delay to wait before the next
    /// attempt, or `None` once the budget is spent.
    pub fn on_transient_failure(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        let delay = self.next_delay;
        self.attempt += 1;
        self.next_delay = self.next_delay.saturating_mul(2);
        Some(delay)
    }
}

/// Connectivity check consulted before each retry.
#[async_trait]
pub trait Reachability: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Never short-circuits retries.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeOnline;

#[async_trait]
impl Reachability for AssumeOnline {
    async fn is_online(&self) -> bool {
        true
    }
}

/// Opens a TCP connection to the API host to decide whether retrying is worthwhile.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn from_url(url: &str, timeout: Duration) -> Option<Self> {
        let parsed = reqwest::Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_string();
        let port = parsed.port_or_known_default()?;
        Some(Self {
            addr: format!("{host}:{port}"),
            timeout,
        })
    }
}

#[async_trait]
impl Reachability for TcpProbe {
    async fn is_online(&self) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, tokio::net::TcpStream::connect(&self.addr)).await,
            Ok(Ok(_))
        )
    }
}

/// GET `url`, retrying 5xx and network failures per `policy`.
/// 4xx answers fail immediately.
pub async fn get_with_retry(
    client: &reqwest::Client,
    url: &str,
    policy: RetryPolicy,
    reach: &dyn Reachability,
    label: &str,
) -> Result<reqwest::Response> {
    let mut state = policy.start();
    loop {
        let err = match client
            .get(url)
            .header("Content-Type", "application/json")
            .send()
            .await
        {
            Ok(res) if res.status().is_success() => return Ok(res),
            Ok(res) => {
                let status = res.status().as_u16();
                let e = ScanError::from_status(status, label);
                if e.is_client_error() {
                    return Err(e);
                }
                e
            }
            Err(e) => ScanError::UpstreamUnavailable(format!("{label}: {e}")),
        };

        let Some(delay) = state.on_transient_failure() else {
            log::warn!("[net] {label} giving up after {} attempts: {err}", state.attempt());
            return Err(match err {
                ScanError::UpstreamUnavailable(_) => err,
                other => ScanError::UpstreamUnavailable(other.to_string()),
            });
        };

        log::warn!(
            "[net] {label} attempt {} failed ({err}), retrying in {}ms",
            state.attempt() - 1,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;

        if !reach.is_online().await {
            return Err(ScanError::UpstreamUnavailable(format!(
                "{label}: no network connection"
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_stops_at_budget() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));
        let mut s = policy.start();
        assert_eq!(s.attempt(), 1);
        assert_eq!(s.on_transient_failure(), Some(Duration::from_millis(1000)));
        assert_eq!(s.attempt(), 2);
        assert_eq!(s.on_transient_failure(), Some(Duration::from_millis(2000)));
        assert_eq!(s.attempt(), 3);
        assert_eq!(s.on_transient_failure(), None);
        assert_eq!(s.attempt(), 3);
    }

    #[test]
    fn single_attempt_policy_never_retries() {
        let mut s = RetryPolicy::new(1, Duration::from_millis(10)).start();
        assert_eq!(s.on_transient_failure(), None);
        // zero is clamped to one attempt
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn probe_parses_host_and_default_port() {
        let p = TcpProbe::from_url("https://query.example.org/v0", Duration::from_secs(1)).unwrap();
        assert_eq!(p.addr, "query.example.org:443");
        let p = TcpProbe::from_url("http://127.0.0.1:8080", Duration::from_secs(1)).unwrap();
        assert_eq!(p.addr, "127.0.0.1:8080");
        assert!(TcpProbe::from_url("not a url", Duration::from_secs(1)).is_none());
    }
}
