//! Registry of live sessions.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use super::Session;

pub type SessionId = Uuid;
pub type SessionRef = Arc<Mutex<Session>>;

/// Owns every live session, keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, SessionRef>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> SessionRef {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session::new(id)));
        self.sessions.insert(id, Arc::clone(&session));
        session
    }

    pub fn get(&self, id: &SessionId) -> Option<SessionRef> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a session, handing it back so its connection can be shut down.
    pub fn end(&self, id: &SessionId) -> Option<SessionRef> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove sessions idle for longer than `ttl`.
    ///
    /// Sessions that are locked or busy are in use and always survive.
    pub fn sweep_idle(&self, ttl: Duration) -> Vec<SessionRef> {
        let now = Instant::now();
        let expired: Vec<SessionId> = self
            .sessions
            .iter()
            .filter_map(|entry| {
                let session = entry.value().try_lock().ok()?;
                let idle = now.saturating_duration_since(session.last_active()) > ttl;
                (idle && !session.is_busy()).then_some(*entry.key())
            })
            .collect();

        expired.iter().filter_map(|id| self.end(id)).collect()
    }
}
