use std::time::Duration;
use tokio::time::Instant;

/// Enforces the politeness gap between consecutive requests to one domain.
/// The gap applies to every request the session makes: GETs, PDF HEAD
/// checks and the robots.txt fetch.
#[derive(Debug)]
pub struct RateLimiter {
    min_gap: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    /// Zero or negative requests-per-second disables the delay.
    pub fn new(requests_per_second: f64) -> Self {
        let min_gap = if requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };
        Self { min_gap, last: None }
    }

    /// Sleep until the gap since the previous request has elapsed, then
    /// stamp this request.
    pub async fn wait(&mut self) {
        if self.min_gap > Duration::ZERO
            && let Some(last) = self.last
        {
            let ready = last + self.min_gap;
            let now = Instant::now();
            if ready > now {
                tokio::time::sleep(ready - now).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
