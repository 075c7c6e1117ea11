//! crates/topic_core/src/gate.rs
//!
//! The registration gate: decides whether a search may run now or has to wait
//! until the user registers.

use crate::domain::{HostIdentity, SessionState};
use crate::ports::{bounded, UserDirectory};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Number of searches a session may run before registration is required.
pub const FREE_SEARCH_LIMIT: u32 = 1;

/// Outcome of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    RequiresRegistration,
}

#[derive(Clone)]
pub struct GateController {
    users: Arc<dyn UserDirectory>,
    free_search_limit: u32,
    store_timeout: Duration,
}

impl GateController {
    pub fn new(users: Arc<dyn UserDirectory>, free_search_limit: u32, store_timeout: Duration) -> Self {
        Self {
            users,
            free_search_limit,
            store_timeout,
        }
    }

    /// Evaluates the gate rules in order:
    /// free searches first, then identity presence, then the directory lookup.
    /// A failed lookup counts as "not registered".
    pub async fn can_search(
        &self,
        session: &SessionState,
        identity: Option<&HostIdentity>,
    ) -> GateDecision {
        if session.search_count < self.free_search_limit {
            return GateDecision::Allowed;
        }

        let Some(identity) = identity else {
            debug!("No host identity; registration required");
            return GateDecision::RequiresRegistration;
        };

        let external_id = identity.external_id();
        let lookup = bounded(self.store_timeout, self.users.find_by_external_id(&external_id)).await;
        match lookup {
            Ok(Some(_)) => GateDecision::Allowed,
            Ok(None) => {
                debug!("No registration record for {}", external_id);
                GateDecision::RequiresRegistration
            }
            Err(e) => {
                warn!("User lookup for {} failed, gating closed: {}", external_id, e);
                GateDecision::RequiresRegistration
            }
        }
    }
}
