//! Owner session state and login results.

use chrono::Duration;

/// Observable guard state.
///
/// `is_owner_logged_in` and `owner_email` are mirrored to durable storage on
/// every mutation; `is_locked` and `lock_time_remaining` are cached views of
/// the ledger evaluation, refreshed by `check_lock_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub is_owner_logged_in: bool,
    pub owner_email: Option<String>,
    pub is_locked: bool,
    pub lock_time_remaining: Duration,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_owner_logged_in: false,
            owner_email: None,
            is_locked: false,
            lock_time_remaining: Duration::zero(),
        }
    }
}

/// Why a login call was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginDenial {
    /// A lockout is active. Credentials were not examined.
    LockedOut { retry_after: Duration },
    /// Wrong email or password while unlocked.
    InvalidCredentials { attempts_remaining: u32 },
}

/// Structured result of a login attempt.
///
/// Wrong credentials and lockout are outcomes, not errors; nothing about a
/// failed login is surfaced as `Err`. `error` carries the user-facing
/// message, `denial` the machine-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub denial: Option<LoginDenial>,
}

impl LoginOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
            denial: None,
        }
    }

    pub fn denied(denial: LoginDenial, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            denial: Some(denial),
        }
    }
}
