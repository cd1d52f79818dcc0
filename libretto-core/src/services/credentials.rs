//! Owner credential check.

/// The single configured owner identity.
///
/// The check is strict equality against the values supplied at
/// construction. There is no hashing and no credential store; real
/// server-side credential management is outside this crate's scope.
#[derive(Clone)]
pub struct OwnerIdentity {
    email: String,
    password: String,
}

impl OwnerIdentity {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Compare supplied credentials against the configured identity.
    ///
    /// Pure; never consults storage and never counts attempts.
    pub fn check(&self, email: &str, password: &str) -> bool {
        self.email == email && self.password == password
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl std::fmt::Debug for OwnerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerIdentity")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
