use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Idle buckets are swept once every this many calls to [`ApiRateLimiter::allow`].
const SWEEP_EVERY: u64 = 256;

/// Sliding-window request counter keyed by client and route.
#[derive(Debug, Clone)]
pub struct ApiRateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Arc<DashMap<String, Vec<Instant>>>,
    calls: Arc<AtomicU64>,
}

impl ApiRateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Arc::new(DashMap::new()),
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record a request and report whether it is allowed, plus the requests left in
    /// the current window.
    pub fn allow(&self, client: &str, route: &str) -> (bool, u32) {
        if (self.calls.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0 {
            self.sweep_expired();
        }

        let bucket_key = format!("{client}:{route}");
        let now = Instant::now();
        let window = self.window;

        let mut entry = self.buckets.entry(bucket_key).or_default();
        entry.retain(|instant| now.duration_since(*instant) < window);

        let used = u32::try_from(entry.len()).unwrap_or(u32::MAX);
        let remaining = self.max_requests.saturating_sub(used);
        if remaining == 0 {
            return (false, 0);
        }

        entry.push(now);
        (true, remaining - 1)
    }

    /// Drop buckets whose every request has left the window.
    pub fn sweep_expired(&self) {
        let now = Instant::now();
        let window = self.window;
        self.buckets
            .retain(|_, hits| hits.last().is_some_and(|last| now.duration_since(*last) < window));
    }

    /// Number of client/route buckets currently held.
    pub fn tracked_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_limit_within_window() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(60), 2);

        assert_eq!(limiter.allow("1.2.3.4", "/api/weather"), (true, 1));
        assert_eq!(limiter.allow("1.2.3.4", "/api/weather"), (true, 0));
        assert_eq!(limiter.allow("1.2.3.4", "/api/weather"), (false, 0));
    }

    #[test]
    fn buckets_are_per_client_and_route() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(60), 1);

        assert!(limiter.allow("a", "/api/weather").0);
        assert!(limiter.allow("b", "/api/weather").0);
        assert!(limiter.allow("a", "/api/place-info").0);
        assert!(!limiter.allow("a", "/api/weather").0);
    }

    #[test]
    fn sweep_reclaims_idle_buckets() {
        let limiter = ApiRateLimiter::new(Duration::from_millis(1), 5);
        for client in 0..50 {
            limiter.allow(&format!("10.0.0.{client}"), "/api/weather");
        }
        assert_eq!(limiter.tracked_buckets(), 50);

        std::thread::sleep(Duration::from_millis(20));
        limiter.sweep_expired();

        assert_eq!(limiter.tracked_buckets(), 0);
    }

    #[test]
    fn allow_sweeps_periodically() {
        let limiter = ApiRateLimiter::new(Duration::from_millis(1), 5);
        for client in 0..SWEEP_EVERY - 1 {
            limiter.allow(&format!("client-{client}"), "/api/weather");
        }
        assert_eq!(limiter.tracked_buckets(), (SWEEP_EVERY - 1) as usize);

        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.allow("late-client", "/api/weather").0);

        assert_eq!(limiter.tracked_buckets(), 1);
    }

    #[test]
    fn sweep_keeps_active_buckets() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(60), 5);
        limiter.allow("1.2.3.4", "/api/weather");
        limiter.sweep_expired();
        assert_eq!(limiter.tracked_buckets(), 1);
        assert_eq!(limiter.allow("1.2.3.4", "/api/weather"), (true, 3));
    }

    #[test]
    fn retry_after_is_at_least_one_second() {
        let limiter = ApiRateLimiter::new(Duration::from_millis(200), 1);
        assert_eq!(limiter.retry_after_secs(), 1);
        assert_eq!(limiter.limit(), 1);
    }
}
