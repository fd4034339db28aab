//! Token bucket shared by every clone of a [`Client`](super::Client).

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket with a burst of one.
///
/// Callers reserve a token and, when the bucket is in debt, sleep until the
/// reservation matures. The lock is never held across the sleep, so queued
/// callers are spaced `1 / rate` seconds apart.
#[derive(Debug)]
pub struct RateLimiter {
    rate: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Capacity of the bucket.
    const BURST: f64 = 1.0;

    /// Create a limiter refilling `rate` tokens per second.
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            bucket: Mutex::new(Bucket {
                tokens: Self::BURST,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Tokens refilled per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Wait until a request may be sent.
    pub async fn acquire(&self) {
        let wait = {
            let now = Instant::now();
            let mut bucket = self.bucket.lock().await;
            let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
            bucket.last_refill = now;
            bucket.tokens = (bucket.tokens + elapsed * self.rate).min(Self::BURST);
            bucket.tokens -= 1.0;
            if bucket.tokens < 0.0 {
                Duration::from_secs_f64(-bucket.tokens / self.rate)
            } else {
                Duration::ZERO
            }
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}
