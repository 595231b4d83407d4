use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Token bucket pacing a handler to `rate_per_minute` operations (§4.7):
/// one token refills every `60s / rate_per_minute`, capacity equals one
/// minute's worth of tokens so a handler can burst after an idle period
/// without exceeding the configured steady-state rate.
pub struct TokenBucket {
    inner: Mutex<State>,
    refill_interval: Duration,
    capacity: f64,
}

struct State {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(rate_per_minute: i64) -> Self {
        let rate_per_minute = rate_per_minute.max(1) as f64;
        TokenBucket {
            inner: Mutex::new(State { tokens: rate_per_minute, last_refill: Instant::now() }),
            refill_interval: Duration::from_secs_f64(60.0 / rate_per_minute),
            capacity: rate_per_minute,
        }
    }

    fn refill(&self, state: &mut State) {
        let elapsed = state.last_refill.elapsed();
        let refilled = elapsed.as_secs_f64() / self.refill_interval.as_secs_f64();
        state.tokens = (state.tokens + refilled).min(self.capacity);
        state.last_refill = Instant::now();
    }

    /// Block until one token is available.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.inner.lock();
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    Some(self.refill_interval)
                }
            };
            match wait {
                None => return,
                Some(d) => tokio::time::sleep(d).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_does_not_block_within_burst_capacity() {
        let bucket = TokenBucket::new(120);
        let started = Instant::now();
        for _ in 0..5 {
            bucket.acquire().await;
        }
        assert!(started.elapsed() < Duration::from_millis(200));
    }
}
