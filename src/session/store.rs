//! In-memory session store.
//!
//! Sessions are created lazily on first access and discarded when ended or
//! after an idle period. Nothing survives a restart.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::config::SessionConfig;

use super::ids::SessionId;
use super::state::Session;

struct SessionEntry {
    session: Session,
    last_seen: Instant,
}

impl SessionEntry {
    fn new(session: Session) -> Self {
        Self {
            session,
            last_seen: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_seen.elapsed() > ttl
    }
}

/// Thread-safe map of isolated per-user sessions.
pub struct SessionStore {
    config: SessionConfig,
    sessions: DashMap<SessionId, SessionEntry>,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
        }
    }

    fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.config.idle_ttl_seconds)
    }

    fn fresh_session(&self) -> Session {
        Session::with_api_key(self.config.default_api_key.as_deref())
    }

    /// Start a new session and return its id.
    #[must_use]
    pub fn create(&self) -> SessionId {
        let id = SessionId::new();
        self.sessions.insert(id, SessionEntry::new(self.fresh_session()));
        debug!("Session {id} created");
        id
    }

    /// Reuse `id` when given, otherwise start a new session.
    #[must_use]
    pub fn resolve(&self, id: Option<SessionId>) -> SessionId {
        id.unwrap_or_else(|| self.create())
    }

    /// Read a session, creating it with defaults if absent or expired.
    pub fn with_session<R>(&self, id: SessionId, f: impl FnOnce(&Session) -> R) -> R {
        self.update(id, |session| f(session))
    }

    /// Mutate a session, creating it with defaults if absent or expired.
    pub fn update<R>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> R) -> R {
        let ttl = self.idle_ttl();
        let mut entry = self
            .sessions
            .entry(id)
            .or_insert_with(|| SessionEntry::new(self.fresh_session()));

        if entry.is_expired(ttl) {
            debug!("Session {id} expired, starting over");
            entry.session = self.fresh_session();
        }
        entry.last_seen = Instant::now();

        f(&mut entry.session)
    }

    /// Snapshot of a session, if it exists and is live.
    #[must_use]
    pub fn get(&self, id: SessionId) -> Option<Session> {
        let ttl = self.idle_ttl();
        self.sessions
            .get(&id)
            .filter(|entry| !entry.is_expired(ttl))
            .map(|entry| entry.session.clone())
    }

    /// End a session. Returns whether it existed.
    pub fn end(&self, id: SessionId) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            debug!("Session {id} ended");
        }
        removed
    }

    /// Drop every idle session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let ttl = self.idle_ttl();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| !entry.is_expired(ttl));
        before.saturating_sub(self.sessions.len())
    }

    /// Number of tracked sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
