use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

type ByteLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Process-wide byte budget shared by every transfer.
///
/// One governor cell is one byte; the burst equals the per-second rate, so a
/// chunk larger than that is paid for in several waits.
#[derive(Clone, Default)]
pub struct Throttle {
    limiter: Option<Arc<ByteLimiter>>,
    burst: u32,
}

impl Throttle {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn per_second(bytes: NonZeroU32) -> Self {
        Self {
            limiter: Some(Arc::new(RateLimiter::direct(Quota::per_second(bytes)))),
            burst: bytes.get(),
        }
    }

    pub fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }

    /// Bytes per second, 0 when unlimited.
    pub fn rate(&self) -> u32 {
        if self.is_limited() {
            self.burst
        } else {
            0
        }
    }

    /// Waits until `n` bytes may pass.
    pub async fn consume(&self, n: usize) {
        let Some(limiter) = &self.limiter else {
            return;
        };
        let mut left = n;
        while left > 0 {
            let step = left.min(self.burst as usize);
            let Some(cells) = NonZeroU32::new(step as u32) else {
                return;
            };
            // step never exceeds the burst, so capacity is always sufficient
            let _ = limiter.until_n_ready(cells).await;
            left -= step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        let throttle = Throttle::unlimited();
        assert!(!throttle.is_limited());
        assert_eq!(throttle.rate(), 0);
        let started = Instant::now();
        throttle.consume(usize::MAX / 2).await;
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_budget_is_shared_between_clones() {
        let throttle = Throttle::per_second(NonZeroU32::new(1000).unwrap());
        assert!(throttle.is_limited());
        assert_eq!(throttle.rate(), 1000);
        let other = throttle.clone();
        let started = Instant::now();
        // first burst is free, the next 500 bytes cost about half a second
        throttle.consume(1000).await;
        other.consume(500).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(400), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(3), "elapsed {:?}", elapsed);
    }
}
