use std::sync::{Arc, RwLock};

/// Session-scoped credential holder, shared between the API client and the
/// shell. The client-side analog of the browser's stored access token: set on
/// login, cleared on logout, attached as a bearer header when present.
///
/// No token inspection happens here; validity is whatever the server says,
/// and the first 401 is the signal that the credential has gone stale.
#[derive(Clone, Default)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: String) {
        *self.token.write().expect("token lock poisoned") = Some(token);
    }

    pub fn clear(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    /// Returns the value for an `Authorization` header, if a credential is set.
    pub fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .expect("token lock poisoned")
            .as_ref()
            .map(|t| format!("Bearer {t}"))
    }
}
