// In-memory implementation of SessionStore.
//
// Sessions live only as long as the process. A restart signs everyone out.

use crate::core::accounts::{SessionIdentity, SessionStore};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;

const TOKEN_BYTES: usize = 32;

/// Maps opaque session tokens to the signed-in account.
///
/// **DashMap:**
/// Requests run concurrently on the Tokio pool, so the map must be shareable
/// without a global lock.
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionIdentity>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    fn new_token() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, identity: SessionIdentity) -> String {
        let token = Self::new_token();
        self.sessions.insert(token.clone(), identity);
        token
    }

    fn get(&self, token: &str) -> Option<SessionIdentity> {
        self.sessions.get(token).map(|entry| entry.value().clone())
    }

    fn remove(&self, token: &str) {
        self.sessions.remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::accounts::AccountKind;

    fn identity() -> SessionIdentity {
        SessionIdentity {
            account_id: 7,
            display_name: "Dr. Lee".to_string(),
            kind: AccountKind::Doctor,
        }
    }

    #[test]
    fn test_create_get_remove() {
        let store = InMemorySessionStore::new();
        let token = store.create(identity());

        assert_eq!(store.get(&token), Some(identity()));
        store.remove(&token);
        assert_eq!(store.get(&token), None);
        assert!(store.sessions.is_empty());
    }

    #[test]
    fn test_tokens_are_unique_and_url_safe() {
        let store = InMemorySessionStore::new();
        let a = store.create(identity());
        let b = store.create(identity());

        assert_ne!(a, b);
        // 32 bytes -> 43 base64 characters without padding
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_unknown_token() {
        let store = InMemorySessionStore::new();
        assert!(store.get("nope").is_none());
        store.remove("nope");
    }
}
