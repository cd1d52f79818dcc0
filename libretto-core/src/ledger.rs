//! The attempt ledger: a durable record of failed owner-login attempts.
//!
//! The ledger is one JSON value in the key-value store. Lock state is never
//! stored as a flag; it is derived from `locked_until` on every evaluation,
//! so it stays correct across restarts without any timer.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lockout behavior knobs.
///
/// The defaults reproduce the production values: five attempts within a
/// fifteen-minute window lock the account for fifteen minutes.
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    /// Failed attempts within one window that trigger the lock.
    pub max_attempts: u32,
    /// How long a triggered lock lasts.
    pub lockout_duration: Duration,
    /// Rolling window during which failed attempts accumulate.
    pub attempt_reset_time: Duration,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_duration: Duration::minutes(15),
            attempt_reset_time: Duration::minutes(15),
        }
    }
}

/// Count of consecutive failed attempts in the current window, the window's
/// start time, and the lock expiry once the threshold has been crossed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptLedger {
    pub count: u32,
    pub first_attempt_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<DateTime<Utc>>,
}

impl AttemptLedger {
    /// An empty ledger whose window starts at `now`.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            first_attempt_at: now,
            locked_until: None,
        }
    }

    /// Apply one failed attempt at `now`.
    ///
    /// A failure later than `attempt_reset_time` after the window start
    /// opens a new window at count 1; otherwise the count increments. The
    /// lock expiry is set the moment the count reaches `max_attempts`.
    pub fn record_failure(&mut self, now: DateTime<Utc>, config: &LockoutConfig) {
        if now - self.first_attempt_at > config.attempt_reset_time {
            self.count = 1;
            self.first_attempt_at = now;
        } else {
            self.count += 1;
        }

        if self.count >= config.max_attempts {
            self.locked_until = Some(now + config.lockout_duration);
        }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// A lock was applied and its expiry has passed.
    pub fn lock_expired(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now >= until)
    }

    /// Time until the lock expires; zero when not locked.
    pub fn remaining_lock_time(&self, now: DateTime<Utc>) -> Duration {
        match self.locked_until {
            Some(until) if until > now => until - now,
            _ => Duration::zero(),
        }
    }
}
