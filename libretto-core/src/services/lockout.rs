//! Lockout evaluation over the persisted attempt ledger.
//!
//! Lock state is recomputed from the ledger's timestamps on every call.
//! Persistence is best-effort by contract: an absent, malformed, or
//! unreadable ledger behaves like an empty one, and write failures degrade
//! to in-memory state for that call. No storage condition ever reaches the
//! login caller as an error.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    ledger::{AttemptLedger, LockoutConfig},
    repositories::KeyValueRepository,
};

/// Key the serialized ledger is stored under.
pub const LEDGER_KEY: &str = "login_attempts";

/// Snapshot of the lock evaluation at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutStatus {
    pub failed_attempts: u32,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutStatus {
    fn unlocked(failed_attempts: u32) -> Self {
        Self {
            failed_attempts,
            is_locked: false,
            locked_until: None,
        }
    }

    /// Time left until the lock expires, as of `now`; zero when unlocked.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        match self.locked_until {
            Some(until) if until > now => until - now,
            _ => Duration::zero(),
        }
    }
}

/// Service that owns the attempt ledger and derives lock state from it.
pub struct LockoutService<R: KeyValueRepository> {
    repository: Arc<R>,
    config: LockoutConfig,
}

impl<R: KeyValueRepository> LockoutService<R> {
    pub fn new(repository: Arc<R>, config: LockoutConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    /// Current lock state.
    ///
    /// An expired lock clears the persisted ledger as a side effect: lock
    /// expiry also resets the attempt history.
    pub async fn status(&self) -> LockoutStatus {
        let now = Utc::now();
        let ledger = self.load_ledger(now).await;

        if ledger.lock_expired(now) {
            self.reset().await;
            return LockoutStatus::unlocked(0);
        }

        Self::status_of(&ledger, now)
    }

    /// Remaining lock duration; zero when unlocked. No side effects.
    pub async fn remaining_lock_time(&self) -> Duration {
        let now = Utc::now();
        self.load_ledger(now).await.remaining_lock_time(now)
    }

    /// Record one failed attempt and return the resulting status.
    pub async fn record_failed_attempt(&self) -> LockoutStatus {
        let now = Utc::now();
        let mut ledger = self.load_ledger(now).await;

        if ledger.lock_expired(now) {
            ledger = AttemptLedger::fresh(now);
        }

        ledger.record_failure(now, &self.config);
        self.save_ledger(&ledger).await;

        if ledger.is_locked(now) {
            tracing::warn!(
                failed_attempts = ledger.count,
                "Failed login attempts reached the lockout threshold"
            );
        }

        Self::status_of(&ledger, now)
    }

    /// Remove the persisted ledger, e.g. after a successful login.
    pub async fn reset(&self) {
        if let Err(e) = self.repository.remove(LEDGER_KEY).await {
            tracing::warn!(error = %e, "Failed to clear the attempt ledger");
        }
    }

    async fn load_ledger(&self, now: DateTime<Utc>) -> AttemptLedger {
        match self.repository.get(LEDGER_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(ledger) => ledger,
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding malformed attempt ledger");
                    AttemptLedger::fresh(now)
                }
            },
            Ok(None) => AttemptLedger::fresh(now),
            Err(e) => {
                tracing::warn!(error = %e, "Attempt ledger unavailable, treating as empty");
                AttemptLedger::fresh(now)
            }
        }
    }

    async fn save_ledger(&self, ledger: &AttemptLedger) {
        let raw = match serde_json::to_string(ledger) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize the attempt ledger");
                return;
            }
        };

        if let Err(e) = self.repository.set(LEDGER_KEY, &raw).await {
            tracing::warn!(error = %e, "Failed to persist the attempt ledger");
        }
    }

    fn status_of(ledger: &AttemptLedger, now: DateTime<Utc>) -> LockoutStatus {
        LockoutStatus {
            failed_attempts: ledger.count,
            is_locked: ledger.is_locked(now),
            locked_until: ledger.locked_until.filter(|until| *until > now),
        }
    }
}
