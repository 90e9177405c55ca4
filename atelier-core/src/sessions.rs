use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

/// Seam to the external authentication service. Login and registration live
/// outside this backend; the auth layer mints sessions through [`issue`] and
/// request handling only resolves bearer tokens back to user ids.
///
/// [`issue`]: Sessions::issue
#[derive(Clone, Debug, Default)]
pub struct Sessions {
    tokens: Arc<RwLock<HashMap<String, i64>>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a bearer token for `user_id`. Called by the auth layer once it
    /// has verified credentials.
    pub fn issue(&self, user_id: i64) -> String {
        let token = Uuid::new_v4().to_string();
        self.write().insert(token.clone(), user_id);
        token
    }

    pub fn resolve(&self, token: &str) -> Option<i64> {
        self.read().get(token).copied()
    }

    /// Logout path for the auth layer. Revoking an unknown token is a no-op.
    pub fn revoke(&self, token: &str) {
        self.write().remove(token);
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, i64>> {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, i64>> {
        self.tokens.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::Sessions;

    #[test]
    fn issued_tokens_resolve_until_revoked() {
        let sessions = Sessions::new();
        let token = sessions.issue(7);
        assert_eq!(sessions.resolve(&token), Some(7));

        sessions.revoke(&token);
        assert_eq!(sessions.resolve(&token), None);

        // Revoking again is harmless.
        sessions.revoke(&token);
    }

    #[test]
    fn unknown_tokens_do_not_resolve() {
        let sessions = Sessions::new();
        assert_eq!(sessions.resolve("not-a-token"), None);
    }
}
