//! Owner authentication guard.
//!
//! The guard orchestrates the credential check and the lockout service,
//! owns the in-memory session state, and mirrors it to the durable
//! key-value store. It is an explicit context object: construct it with
//! [`AuthGuard::initialize`], hand it to whatever layer needs auth state,
//! and call [`AuthGuard::dispose`] when tearing down.
//!
//! Every failure is converted to a structured [`LoginOutcome`] at this
//! boundary; wrong credentials and lockout never surface as errors, and
//! storage trouble degrades to in-memory state for that call.

use std::sync::{Arc, RwLock};

use chrono::{Duration, Utc};
use tokio::sync::watch;

use crate::{
    ledger::LockoutConfig,
    repositories::KeyValueRepository,
    services::{credentials::OwnerIdentity, lockout::LockoutService},
    session::{LoginDenial, LoginOutcome, SessionState},
};

/// Durable marker set to `"true"` while the owner is logged in.
pub const SESSION_KEY: &str = "owner_logged_in";
/// Durable copy of the logged-in owner email.
pub const EMAIL_KEY: &str = "owner_email";

pub struct AuthGuard<R: KeyValueRepository> {
    repository: Arc<R>,
    identity: OwnerIdentity,
    lockout: LockoutService<R>,
    state: RwLock<SessionState>,
    shutdown: watch::Sender<bool>,
}

impl<R: KeyValueRepository> AuthGuard<R> {
    /// Create the guard and rehydrate session state from durable storage.
    ///
    /// A valid persisted session (marker plus email) starts the guard
    /// logged in; anything else, including unreadable storage, starts it
    /// logged out. The lock view is refreshed before the guard is handed
    /// back, so state is consistent with storage from the first call on.
    pub async fn initialize(
        repository: Arc<R>,
        identity: OwnerIdentity,
        config: LockoutConfig,
    ) -> Self {
        let lockout = LockoutService::new(Arc::clone(&repository), config);
        let (shutdown, _) = watch::channel(false);
        let guard = Self {
            repository,
            identity,
            lockout,
            state: RwLock::new(SessionState::default()),
            shutdown,
        };

        guard.rehydrate().await;
        guard.check_lock_status().await;
        guard
    }

    /// Attempt an owner login.
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        let status = self.lockout.status().await;
        if status.is_locked {
            let remaining = status.remaining_at(Utc::now());
            self.with_state(|s| {
                s.is_locked = true;
                s.lock_time_remaining = remaining;
            });

            let minutes = minutes_remaining(remaining);
            tracing::info!(minutes, "Login rejected while locked");
            return LoginOutcome::denied(
                LoginDenial::LockedOut {
                    retry_after: remaining,
                },
                format!(
                    "Account temporarily locked. Try again in {minutes} {}.",
                    plural(minutes, "minute", "minutes")
                ),
            );
        }

        if self.identity.check(email, password) {
            self.lockout.reset().await;
            self.with_state(|s| {
                s.is_owner_logged_in = true;
                s.owner_email = Some(email.to_string());
                s.is_locked = false;
                s.lock_time_remaining = Duration::zero();
            });
            self.persist_session(email).await;

            tracing::info!(owner = %email, "Owner logged in");
            return LoginOutcome::succeeded();
        }

        let status = self.lockout.record_failed_attempt().await;
        if status.is_locked {
            let remaining = status.remaining_at(Utc::now());
            self.with_state(|s| {
                s.is_locked = true;
                s.lock_time_remaining = remaining;
            });

            let minutes = self.lockout.config().lockout_duration.num_minutes();
            return LoginOutcome::denied(
                LoginDenial::LockedOut {
                    retry_after: remaining,
                },
                format!("Too many failed attempts. Account locked for {minutes} minutes."),
            );
        }

        let attempts_remaining = self
            .lockout
            .config()
            .max_attempts
            .saturating_sub(status.failed_attempts);
        LoginOutcome::denied(
            LoginDenial::InvalidCredentials { attempts_remaining },
            format!(
                "Incorrect email or password. {attempts_remaining} {} remaining.",
                plural(attempts_remaining.into(), "attempt", "attempts")
            ),
        )
    }

    /// End the owner session.
    ///
    /// Clears the in-memory session fields and removes the durable session
    /// markers. The attempt ledger is left untouched: lock state is
    /// independent of login state.
    pub async fn logout(&self) {
        self.with_state(|s| {
            s.is_owner_logged_in = false;
            s.owner_email = None;
        });

        if let Err(e) = self.repository.remove(SESSION_KEY).await {
            tracing::warn!(error = %e, "Failed to remove the session marker");
        }
        if let Err(e) = self.repository.remove(EMAIL_KEY).await {
            tracing::warn!(error = %e, "Failed to remove the persisted owner email");
        }

        tracing::info!("Owner logged out");
    }

    /// Refresh the cached lock view from the ledger.
    ///
    /// Idempotent; the only side effect is the lockout service's lazy
    /// clear of an expired lock.
    pub async fn check_lock_status(&self) {
        let status = self.lockout.status().await;
        let remaining = status.remaining_at(Utc::now());
        self.with_state(|s| {
            s.is_locked = status.is_locked;
            s.lock_time_remaining = remaining;
        });
    }

    /// Snapshot of the observable session state.
    pub fn session(&self) -> SessionState {
        self.read_state()
    }

    pub fn is_owner_logged_in(&self) -> bool {
        self.read_state().is_owner_logged_in
    }

    pub fn owner_email(&self) -> Option<String> {
        self.read_state().owner_email
    }

    pub fn is_locked(&self) -> bool {
        self.read_state().is_locked
    }

    pub fn lock_time_remaining(&self) -> Duration {
        self.read_state().lock_time_remaining
    }

    /// Spawn the one-second lock countdown refresher.
    ///
    /// Display plumbing only: lock-state correctness never depends on this
    /// task running, and it can be stopped at any time via
    /// [`AuthGuard::dispose`].
    pub fn start_countdown_task(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let mut shutdown = self.shutdown.subscribe();
        let guard = self;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        guard.check_lock_status().await;
                    }
                    _ = shutdown.changed() => {
                        tracing::debug!("Stopping the lock countdown task");
                        break;
                    }
                }
            }
        })
    }

    /// Tear the guard down: stop countdown tasks.
    ///
    /// In-memory and durable state are left exactly as they are.
    pub fn dispose(&self) {
        let _ = self.shutdown.send(true);
    }

    async fn rehydrate(&self) {
        let marker_set = match self.repository.get(SESSION_KEY).await {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                tracing::warn!(error = %e, "Session marker unavailable, starting logged out");
                false
            }
        };
        if !marker_set {
            return;
        }

        match self.repository.get(EMAIL_KEY).await {
            Ok(Some(email)) => {
                tracing::info!(owner = %email, "Restored owner session from storage");
                self.with_state(|s| {
                    s.is_owner_logged_in = true;
                    s.owner_email = Some(email);
                });
            }
            // A marker without an email is not a valid session.
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Owner email unavailable, starting logged out");
            }
        }
    }

    async fn persist_session(&self, email: &str) {
        if let Err(e) = self.repository.set(SESSION_KEY, "true").await {
            tracing::warn!(error = %e, "Failed to persist the session marker");
        }
        if let Err(e) = self.repository.set(EMAIL_KEY, email).await {
            tracing::warn!(error = %e, "Failed to persist the owner email");
        }
    }

    fn read_state(&self) -> SessionState {
        self.state
            .read()
            .expect("session state lock poisoned")
            .clone()
    }

    fn with_state(&self, mutate: impl FnOnce(&mut SessionState)) {
        let mut state = self.state.write().expect("session state lock poisoned");
        mutate(&mut state);
    }
}

fn minutes_remaining(remaining: Duration) -> i64 {
    (remaining.num_milliseconds().max(0) as u64).div_ceil(60_000) as i64
}

fn plural<'a>(n: i64, singular: &'a str, plural: &'a str) -> &'a str {
    if n == 1 { singular } else { plural }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Error,
        error::StorageError,
        ledger::AttemptLedger,
        services::lockout::LEDGER_KEY,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const OWNER_EMAIL: &str = "owner@example.com";
    const OWNER_PASSWORD: &str = "Library2025top!";

    struct MemoryKeyValueRepository {
        entries: Mutex<HashMap<String, String>>,
    }

    impl MemoryKeyValueRepository {
        fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
            }
        }

        fn insert(&self, key: &str, value: String) {
            self.entries.lock().unwrap().insert(key.to_string(), value);
        }

        fn value_of(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).cloned()
        }
    }

    #[async_trait]
    impl KeyValueRepository for MemoryKeyValueRepository {
        async fn get(&self, key: &str) -> Result<Option<String>, Error> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<(), Error> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }

    struct UnavailableKeyValueRepository;

    #[async_trait]
    impl KeyValueRepository for UnavailableKeyValueRepository {
        async fn get(&self, _key: &str) -> Result<Option<String>, Error> {
            Err(StorageError::Connection("store offline".to_string()).into())
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), Error> {
            Err(StorageError::Connection("store offline".to_string()).into())
        }

        async fn remove(&self, _key: &str) -> Result<(), Error> {
            Err(StorageError::Connection("store offline".to_string()).into())
        }
    }

    async fn guard(repo: Arc<MemoryKeyValueRepository>) -> AuthGuard<MemoryKeyValueRepository> {
        AuthGuard::initialize(
            repo,
            OwnerIdentity::new(OWNER_EMAIL, OWNER_PASSWORD),
            LockoutConfig::default(),
        )
        .await
    }

    fn attempts_remaining(outcome: &LoginOutcome) -> Option<u32> {
        match outcome.denial {
            Some(LoginDenial::InvalidCredentials { attempts_remaining }) => {
                Some(attempts_remaining)
            }
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_wrong_credentials_count_down_attempts() {
        let repo = Arc::new(MemoryKeyValueRepository::new());
        let guard = guard(repo).await;

        for expected in [4u32, 3, 2, 1] {
            let outcome = guard.login("x@x.com", "wrong").await;
            assert!(!outcome.success);
            assert_eq!(attempts_remaining(&outcome), Some(expected));
            assert!(!guard.is_locked());
        }
    }

    #[tokio::test]
    async fn test_fifth_failure_locks_the_account() {
        let repo = Arc::new(MemoryKeyValueRepository::new());
        let guard = guard(repo).await;

        for _ in 0..4 {
            guard.login("x@x.com", "wrong").await;
        }
        let outcome = guard.login("x@x.com", "wrong").await;

        assert!(!outcome.success);
        assert!(matches!(
            outcome.denial,
            Some(LoginDenial::LockedOut { .. })
        ));
        assert_eq!(
            outcome.error.as_deref(),
            Some("Too many failed attempts. Account locked for 15 minutes.")
        );
        assert!(guard.is_locked());

        let remaining = guard.lock_time_remaining();
        assert!(remaining > Duration::minutes(14));
        assert!(remaining <= Duration::minutes(15));
    }

    #[tokio::test]
    async fn test_successful_login_sets_session_and_clears_ledger() {
        let repo = Arc::new(MemoryKeyValueRepository::new());
        let guard = guard(Arc::clone(&repo)).await;

        guard.login(OWNER_EMAIL, "wrong").await;
        guard.login(OWNER_EMAIL, "wrong").await;

        let outcome = guard.login(OWNER_EMAIL, OWNER_PASSWORD).await;
        assert!(outcome.success);
        assert!(outcome.error.is_none());
        assert!(guard.is_owner_logged_in());
        assert_eq!(guard.owner_email().as_deref(), Some(OWNER_EMAIL));

        // Write-through: markers persisted, ledger gone.
        assert_eq!(repo.value_of(SESSION_KEY).as_deref(), Some("true"));
        assert_eq!(repo.value_of(EMAIL_KEY).as_deref(), Some(OWNER_EMAIL));
        assert!(repo.value_of(LEDGER_KEY).is_none());

        // The next failure starts a fresh count.
        let outcome = guard.login(OWNER_EMAIL, "wrong").await;
        assert_eq!(attempts_remaining(&outcome), Some(4));
    }

    #[tokio::test]
    async fn test_correct_credentials_rejected_while_locked() {
        let repo = Arc::new(MemoryKeyValueRepository::new());
        let guard = guard(repo).await;

        for _ in 0..5 {
            guard.login("x@x.com", "wrong").await;
        }

        let outcome = guard.login(OWNER_EMAIL, OWNER_PASSWORD).await;
        assert!(!outcome.success);
        assert!(matches!(
            outcome.denial,
            Some(LoginDenial::LockedOut { .. })
        ));
        assert!(
            outcome
                .error
                .as_deref()
                .unwrap()
                .starts_with("Account temporarily locked.")
        );
        assert!(!guard.is_owner_logged_in());
    }

    #[tokio::test]
    async fn test_lockout_while_locked_leaves_ledger_untouched() {
        let repo = Arc::new(MemoryKeyValueRepository::new());
        let guard = guard(Arc::clone(&repo)).await;

        for _ in 0..5 {
            guard.login("x@x.com", "wrong").await;
        }
        let ledger_before = repo.value_of(LEDGER_KEY);

        guard.login("x@x.com", "wrong").await;
        assert_eq!(repo.value_of(LEDGER_KEY), ledger_before);
    }

    #[tokio::test]
    async fn test_expired_lock_unlocks_and_restarts_window() {
        let repo = Arc::new(MemoryKeyValueRepository::new());
        let now = Utc::now();
        repo.insert(
            LEDGER_KEY,
            serde_json::to_string(&AttemptLedger {
                count: 5,
                first_attempt_at: now - Duration::minutes(31),
                locked_until: Some(now - Duration::milliseconds(1)),
            })
            .unwrap(),
        );
        let guard = guard(Arc::clone(&repo)).await;

        guard.check_lock_status().await;
        assert!(!guard.is_locked());
        assert_eq!(guard.lock_time_remaining(), Duration::zero());

        // Treated as attempt 1 of a fresh window.
        let outcome = guard.login("x@x.com", "wrong").await;
        assert_eq!(attempts_remaining(&outcome), Some(4));
    }

    #[tokio::test]
    async fn test_initialize_rehydrates_persisted_session() {
        let repo = Arc::new(MemoryKeyValueRepository::new());
        repo.insert(SESSION_KEY, "true".to_string());
        repo.insert(EMAIL_KEY, OWNER_EMAIL.to_string());

        let guard = guard(repo).await;
        assert!(guard.is_owner_logged_in());
        assert_eq!(guard.owner_email().as_deref(), Some(OWNER_EMAIL));
    }

    #[tokio::test]
    async fn test_marker_without_email_is_not_a_session() {
        let repo = Arc::new(MemoryKeyValueRepository::new());
        repo.insert(SESSION_KEY, "true".to_string());

        let guard = guard(repo).await;
        assert!(!guard.is_owner_logged_in());
    }

    #[tokio::test]
    async fn test_logout_clears_session_but_not_ledger() {
        let repo = Arc::new(MemoryKeyValueRepository::new());
        let guard = guard(Arc::clone(&repo)).await;

        guard.login(OWNER_EMAIL, OWNER_PASSWORD).await;

        // A ledger written after login must survive logout.
        repo.insert(
            LEDGER_KEY,
            serde_json::to_string(&AttemptLedger::fresh(Utc::now())).unwrap(),
        );

        guard.logout().await;
        assert!(!guard.is_owner_logged_in());
        assert!(guard.owner_email().is_none());
        assert!(repo.value_of(SESSION_KEY).is_none());
        assert!(repo.value_of(EMAIL_KEY).is_none());
        assert!(repo.value_of(LEDGER_KEY).is_some());
    }

    #[tokio::test]
    async fn test_login_succeeds_with_unavailable_storage() {
        let repo = Arc::new(UnavailableKeyValueRepository);
        let guard = AuthGuard::initialize(
            repo,
            OwnerIdentity::new(OWNER_EMAIL, OWNER_PASSWORD),
            LockoutConfig::default(),
        )
        .await;

        let outcome = guard.login(OWNER_EMAIL, OWNER_PASSWORD).await;
        assert!(outcome.success);
        assert!(guard.is_owner_logged_in());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_stops_the_countdown_task() {
        let repo = Arc::new(MemoryKeyValueRepository::new());
        let guard = Arc::new(guard(repo).await);

        let handle = Arc::clone(&guard).start_countdown_task();
        guard.dispose();

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("countdown task did not stop")
            .expect("countdown task panicked");
    }
}
