//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the registry of live sessions.

use crate::config::Config;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use topic_core::domain::{HostIdentity, SessionState};
use topic_core::flow::SearchFlow;
use topic_core::ports::{EventStore, UserDirectory};
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub flow: SearchFlow,
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        events: Arc<dyn EventStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        let flow = SearchFlow::new(events, users, config.flow_settings());
        let sessions = Arc::new(SessionRegistry::new(config.session_ttl));
        Self {
            flow,
            config,
            sessions,
        }
    }
}

//=========================================================================================
// LiveSession (Specific to One Mini-App View)
//=========================================================================================

/// One user's interaction state for the lifetime of the mini-app view.
pub struct LiveSession {
    /// Captured once when the session starts.
    pub identity: Option<HostIdentity>,
    pub state: SessionState,
    pub started_at: DateTime<Utc>,
}

/// Live sessions by id. Each session sits behind its own lock so that only one
/// search per session can be in flight. Sessions idle for longer than the TTL are
/// dropped; a closed mini-app view never ends its session explicitly.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SessionSlot>>,
    ttl: Duration,
}

struct SessionSlot {
    session: Arc<Mutex<LiveSession>>,
    last_seen: Instant,
}

impl SessionSlot {
    fn expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.last_seen) > ttl
    }
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn start(&self, identity: Option<HostIdentity>) -> Uuid {
        let id = Uuid::new_v4();
        let session = LiveSession {
            identity,
            state: SessionState::new(),
            started_at: Utc::now(),
        };
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| !slot.expired(now, self.ttl));
        if sessions.len() < before {
            debug!("Expired {} idle sessions", before - sessions.len());
        }
        sessions.insert(
            id,
            SessionSlot {
                session: Arc::new(Mutex::new(session)),
                last_seen: now,
            },
        );
        id
    }

    /// Looks up a session and marks it as seen. Expired sessions are removed
    /// and reported as missing.
    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<LiveSession>>> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        if sessions.get(&id)?.expired(now, self.ttl) {
            sessions.remove(&id);
            return None;
        }
        let slot = sessions.get_mut(&id)?;
        slot.last_seen = now;
        Some(slot.session.clone())
    }

    /// Forgets the session. Work already holding it runs to completion.
    pub async fn end(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Drops every session idle past the TTL and returns how many were dropped.
    pub async fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| !slot.expired(now, self.ttl));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
