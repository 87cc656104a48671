use bookclub_voting::VoteRateLimiter;
use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter,
};
use std::num::NonZeroU32;
use tracing::debug;

use crate::config::RateLimitConfig;

/// Type alias for a limiter keyed by voter id
type VoterRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Prune idle voters once this many are tracked
const PRUNE_THRESHOLD: usize = 10_000;

/// Per-voter vote throttle backed by a governor keyed limiter.
/// Each voter gets `votes_per_minute` with up to `burst_size` votes in quick succession.
pub struct VoteRateLimit {
    config: RateLimitConfig,
    limiter: VoterRateLimiter,
}

impl VoteRateLimit {
    pub fn new(config: RateLimitConfig) -> Self {
        let per_minute = NonZeroU32::new(config.votes_per_minute).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(per_minute).allow_burst(burst);

        debug!(
            votes_per_minute = %per_minute,
            burst = %burst,
            enabled = config.enabled,
            "Created vote rate limiter"
        );

        Self {
            config,
            limiter: RateLimiter::keyed(quota),
        }
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.config.retry_after_secs()
    }
}

impl VoteRateLimiter for VoteRateLimit {
    fn check(&self, voter_id: &str) -> bool {
        if !self.config.enabled {
            return true;
        }

        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }

        let allowed = self.limiter.check_key(&voter_id.to_string()).is_ok();
        if !allowed {
            debug!(voter = %voter_id, "Vote rate limit reached");
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(votes_per_minute: u32, burst_size: u32) -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            votes_per_minute,
            burst_size,
        }
    }

    #[test]
    fn test_burst_then_throttle() {
        let limiter = VoteRateLimit::new(config(30, 3));

        assert!(limiter.check("alice"));
        assert!(limiter.check("alice"));
        assert!(limiter.check("alice"));
        assert!(!limiter.check("alice"));
    }

    #[test]
    fn test_voters_are_limited_independently() {
        let limiter = VoteRateLimit::new(config(30, 1));

        assert!(limiter.check("alice"));
        assert!(!limiter.check("alice"));
        assert!(limiter.check("bob"));
    }

    #[test]
    fn test_disabled_limiter_never_throttles() {
        let mut cfg = config(1, 1);
        cfg.enabled = false;
        let limiter = VoteRateLimit::new(cfg);

        for _ in 0..10 {
            assert!(limiter.check("alice"));
        }
    }

    #[test]
    fn test_retry_after_follows_refill_rate() {
        assert_eq!(VoteRateLimit::new(config(30, 5)).retry_after_secs(), 2);
        assert_eq!(VoteRateLimit::new(config(7, 5)).retry_after_secs(), 9);
        assert_eq!(VoteRateLimit::new(config(120, 5)).retry_after_secs(), 1);
    }
}
