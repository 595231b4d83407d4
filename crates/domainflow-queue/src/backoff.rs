use std::time::Duration;

/// Backoff and retry knobs named in the Configuration list (§6).
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub lease_duration: Duration,
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub max_attempts_default: i64,
    pub backoff_base: Duration,
    pub backoff_ceiling: Duration,
    pub jitter_fraction: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            lease_duration: Duration::from_secs(120),
            poll_interval: Duration::from_millis(500),
            heartbeat_interval: Duration::from_secs(30),
            max_attempts_default: 5,
            backoff_base: Duration::from_secs(1),
            backoff_ceiling: Duration::from_secs(300),
            jitter_fraction: 0.5,
        }
    }
}

/// `base * 2^(attempts-1) * (0.5 + rand)`, capped at `backoff_ceiling`
/// (§4.5). `attempts` is the attempt count *after* the failing attempt,
/// so the first retry (attempts=1) waits roughly one `backoff_base`.
pub fn compute_backoff(attempts: i64, config: &QueueConfig) -> Duration {
    let exponent = (attempts.max(1) - 1).min(32) as u32;
    let multiplier = 2u64.saturating_pow(exponent);
    let base_millis = config.backoff_base.as_millis() as u64;
    let scaled = base_millis.saturating_mul(multiplier);

    let jitter = 0.5 + rand::random::<f64>() * config.jitter_fraction;
    let jittered_millis = (scaled as f64 * jitter) as u64;

    Duration::from_millis(jittered_millis).min(config.backoff_ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_respects_ceiling() {
        let config = QueueConfig {
            backoff_base: Duration::from_secs(1),
            backoff_ceiling: Duration::from_secs(10),
            jitter_fraction: 0.0,
            ..QueueConfig::default()
        };
        // with jitter_fraction = 0.0, the multiplier is a deterministic 0.5
        assert_eq!(compute_backoff(1, &config), Duration::from_millis(500));
        assert_eq!(compute_backoff(2, &config), Duration::from_millis(1000));
        assert_eq!(compute_backoff(10, &config), Duration::from_secs(10));
    }
}
