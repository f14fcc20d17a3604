// [libs/infra/download-dlq/src/backoff.rs]
use chrono::Duration;

/// §4.3: `delay = base_delay_ms * multiplier^(attempt-1)`, capped so a
/// pathologically high attempt count can't overflow the multiplication.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base_delay_ms: u64,
    pub multiplier: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            multiplier: 2,
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let factor = (self.multiplier as u64).saturating_pow(exponent);
        let delay_ms = self.base_delay_ms.saturating_mul(factor);
        Duration::milliseconds(delay_ms as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_uses_base_delay() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::milliseconds(1000));
    }

    #[test]
    fn delay_doubles_each_attempt() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for_attempt(2), Duration::milliseconds(2000));
        assert_eq!(policy.delay_for_attempt(3), Duration::milliseconds(4000));
        assert_eq!(policy.delay_for_attempt(4), Duration::milliseconds(8000));
    }
}
