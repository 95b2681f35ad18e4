//! Session lifecycle store
//!
//! Sessions are minted by a successful `initialize`, renewed on every
//! request that presents a valid `Mcp-Session-Id`, and dropped on DELETE
//! or after the sliding TTL lapses. The store is the only shared mutable
//! state in the server.

use async_trait::async_trait;
use rand::RngCore;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Default sliding session TTL
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Per-session metadata
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub created_at: Instant,
    pub last_activity: Instant,
}

/// Keyed TTL store for session metadata.
///
/// An expired session is indistinguishable from one that never existed:
/// `validate` answers false for both.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Mint a new session id (32 lowercase hex chars, 128 bits of entropy)
    async fn create(&self) -> String;

    /// Whether the id refers to a live session
    async fn validate(&self, session_id: &str) -> bool;

    /// Restart the TTL window for a live session
    async fn touch(&self, session_id: &str);

    /// Remove a session; idempotent
    async fn delete(&self, session_id: &str);
}

/// In-process store over a concurrent map with lazy expiry
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn generate_id() -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().fold(String::with_capacity(32), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self) -> String {
        let id = Self::generate_id();
        let now = Instant::now();
        let session = Session {
            created_at: now,
            last_activity: now,
        };
        self.sessions.write().await.insert(id.clone(), session);
        debug!(session_id = %id, "session created");
        id
    }

    async fn validate(&self, session_id: &str) -> bool {
        let expired = {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(session) => session.last_activity.elapsed() > self.ttl,
                None => return false,
            }
        };

        if expired {
            // Re-check under the write lock; a concurrent touch may have
            // renewed the session in the meantime.
            let mut sessions = self.sessions.write().await;
            match sessions.get(session_id) {
                Some(session) if session.last_activity.elapsed() > self.ttl => {
                    sessions.remove(session_id);
                    debug!(session_id = %session_id, "session expired");
                    false
                }
                Some(_) => true,
                None => false,
            }
        } else {
            true
        }
    }

    async fn touch(&self, session_id: &str) {
        // Atomic in-place renewal; no delete/reinsert gap for concurrent
        // requests to fall into.
        if let Some(session) = self.sessions.write().await.get_mut(session_id) {
            session.last_activity = Instant::now();
        }
    }

    async fn delete(&self, session_id: &str) {
        if self.sessions.write().await.remove(session_id).is_some() {
            debug!(session_id = %session_id, "session deleted");
        }
    }
}
