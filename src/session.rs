use crate::models::User;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// SessionToken
///
/// Opaque per-client key into the session store. Travels in the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    /// Mints a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a cookie value. Anything that is not a UUID is treated as no session.
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// SessionStore Trait
///
/// Server-side record of which user is logged in on which client. Only the
/// extractors in `auth` read from it; lifecycle code receives the resolved user
/// as an explicit argument.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn current_user(&self, token: SessionToken) -> Option<User>;

    /// Installs the user for this token, replacing any previous payload.
    async fn set_current_user(&self, token: SessionToken, user: User);

    async fn clear(&self, token: SessionToken);

    /// Starts a new session for a freshly authenticated user.
    async fn open(&self, user: User) -> SessionToken {
        let token = SessionToken::generate();
        self.set_current_user(token, user).await;
        token
    }
}

/// SessionState
///
/// The concrete type used to share the session store across the application state.
pub type SessionState = Arc<dyn SessionStore>;

/// MemorySessionStore
///
/// Process-local session map. Sessions do not survive a restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionToken, User>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn current_user(&self, token: SessionToken) -> Option<User> {
        self.sessions.read().await.get(&token).cloned()
    }

    async fn set_current_user(&self, token: SessionToken, user: User) {
        self.sessions.write().await.insert(token, user);
    }

    async fn clear(&self, token: SessionToken) {
        self.sessions.write().await.remove(&token);
    }
}
