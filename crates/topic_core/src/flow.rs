//! crates/topic_core/src/flow.rs
//!
//! Orchestrates one search: gate check, result links, best-effort event logging
//! and trend refresh. Also completes registration for a gated session.

use crate::domain::{
    HostIdentity, Keyword, Platform, RegistrationProfile, ResultLink, SearchEvent, SessionState,
    TrendEntry, UserRecord,
};
use crate::gate::{GateController, GateDecision, FREE_SEARCH_LIMIT};
use crate::links::build_result_links;
use crate::ports::{bounded, EventStore, PortError, UserDirectory};
use crate::trends::{TrendAggregator, DEFAULT_TREND_TOP_K, DEFAULT_TREND_WINDOW};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Tunables for the search flow.
#[derive(Debug, Clone, Copy)]
pub struct FlowSettings {
    pub free_search_limit: u32,
    pub trend_window: usize,
    pub trend_top_k: usize,
    pub store_timeout: Duration,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            free_search_limit: FREE_SEARCH_LIMIT,
            trend_window: DEFAULT_TREND_WINDOW,
            trend_top_k: DEFAULT_TREND_TOP_K,
            store_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The search ran. `trends` is the list recomputed after logging it.
    Completed {
        results: Vec<ResultLink>,
        trends: Vec<TrendEntry>,
    },
    /// The gate held the search back until the user registers.
    Deferred,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Registration needs a host identity")]
    MissingIdentity,
    /// The store could not be reached; the caller may try again.
    #[error("Registration could not be saved: {0}")]
    Store(#[source] PortError),
}

#[derive(Clone)]
pub struct SearchFlow {
    events: Arc<dyn EventStore>,
    users: Arc<dyn UserDirectory>,
    gate: GateController,
    trends: TrendAggregator,
    store_timeout: Duration,
}

impl SearchFlow {
    pub fn new(
        events: Arc<dyn EventStore>,
        users: Arc<dyn UserDirectory>,
        settings: FlowSettings,
    ) -> Self {
        let gate = GateController::new(
            users.clone(),
            settings.free_search_limit,
            settings.store_timeout,
        );
        let trends = TrendAggregator::new(
            events.clone(),
            settings.trend_window,
            settings.trend_top_k,
            settings.store_timeout,
        );
        Self {
            events,
            users,
            gate,
            trends,
            store_timeout: settings.store_timeout,
        }
    }

    pub fn gate(&self) -> &GateController {
        &self.gate
    }

    /// The trend list as of now. Used for the initial load.
    pub async fn trends(&self) -> Vec<TrendEntry> {
        self.trends.compute_trends().await
    }

    /// Runs one search for `session`.
    ///
    /// A deferred search only raises `pending_registration`. A completed one always
    /// returns its links, even when the events could not be logged.
    pub async fn run_search(
        &self,
        keyword: &Keyword,
        session: &mut SessionState,
        identity: Option<&HostIdentity>,
    ) -> SearchOutcome {
        if self.gate.can_search(session, identity).await == GateDecision::RequiresRegistration {
            session.pending_registration = true;
            return SearchOutcome::Deferred;
        }

        let results = build_result_links(keyword);
        self.log_search(keyword).await;
        session.search_count += 1;

        let trends = self.trends.compute_trends().await;
        SearchOutcome::Completed { results, trends }
    }

    /// Appends one event per platform. Failures are logged and dropped.
    async fn log_search(&self, keyword: &Keyword) {
        let created_at = Utc::now();
        let appends = Platform::ALL.into_iter().map(|platform| {
            let event = SearchEvent {
                keyword: keyword.as_str().to_string(),
                platform,
                created_at,
            };
            async move {
                (platform, bounded(self.store_timeout, self.events.append(event)).await)
            }
        });

        for (platform, result) in join_all(appends).await {
            if let Err(e) = result {
                warn!("Failed to log {} search for '{}': {}", platform, keyword, e);
            }
        }
    }

    /// Stores a registration record for `identity` and clears the pending prompt.
    ///
    /// An already-registered identity counts as success. Store failures leave
    /// the prompt pending and are returned for a retry.
    pub async fn register(
        &self,
        session: &mut SessionState,
        identity: Option<&HostIdentity>,
        profile: RegistrationProfile,
    ) -> Result<(), RegistrationError> {
        let identity = identity.ok_or(RegistrationError::MissingIdentity)?;
        let record = UserRecord {
            external_id: identity.external_id(),
            phone: non_blank(profile.phone),
            display_name: non_blank(profile.display_name)
                .or_else(|| non_blank(identity.first_name.clone())),
            location: non_blank(profile.location),
        };
        let external_id = record.external_id.clone();

        match bounded(self.store_timeout, self.users.insert(record)).await {
            Ok(()) => info!("Registered user {}", external_id),
            Err(PortError::Duplicate(_)) => {
                info!("User {} was already registered", external_id);
            }
            Err(e) => {
                warn!("Registration for {} failed: {}", external_id, e);
                return Err(RegistrationError::Store(e));
            }
        }

        session.pending_registration = false;
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeEventStore, FakeUserDirectory};
    use std::sync::atomic::Ordering;

    struct Harness {
        events: Arc<FakeEventStore>,
        users: Arc<FakeUserDirectory>,
        flow: SearchFlow,
    }

    fn harness() -> Harness {
        let events = Arc::new(FakeEventStore::default());
        let users = Arc::new(FakeUserDirectory::default());
        let flow = SearchFlow::new(events.clone(), users.clone(), FlowSettings::default());
        Harness { events, users, flow }
    }

    fn identity() -> HostIdentity {
        HostIdentity {
            id: 42,
            first_name: Some("Dilnoza".to_string()),
            last_name: None,
            username: Some("dilnoza".to_string()),
        }
    }

    fn keyword(raw: &str) -> Keyword {
        Keyword::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn first_search_completes_and_logs_both_platforms() {
        let h = harness();
        let mut session = SessionState::new();

        let outcome = h.flow.run_search(&keyword("cats  "), &mut session, None).await;

        let SearchOutcome::Completed { results, trends } = outcome else {
            panic!("expected a completed search");
        };
        assert_eq!(results.len(), 2);
        assert!(results[0].url.ends_with("?q=cats"));
        assert!(results[1].url.ends_with("/s/cats"));
        assert_eq!(session.search_count, 1);
        assert!(!session.pending_registration);

        let logged = h.events.events.lock().unwrap().clone();
        assert_eq!(logged.len(), 2);
        assert!(logged.iter().all(|e| e.keyword == "cats"));
        assert!(logged.iter().any(|e| e.platform == Platform::Instagram));
        assert!(logged.iter().any(|e| e.platform == Platform::Telegram));
        assert_eq!(logged[0].created_at, logged[1].created_at);

        assert_eq!(
            trends,
            vec![TrendEntry {
                keyword: "cats".to_string(),
                count: 2
            }]
        );
    }

    #[tokio::test]
    async fn second_search_without_identity_is_deferred() {
        let h = harness();
        let mut session = SessionState::new();
        h.flow.run_search(&keyword("cats"), &mut session, None).await;

        let outcome = h.flow.run_search(&keyword("dogs"), &mut session, None).await;

        assert_eq!(outcome, SearchOutcome::Deferred);
        assert_eq!(session.search_count, 1);
        assert!(session.pending_registration);
        assert_eq!(h.events.len(), 2);
    }

    #[tokio::test]
    async fn logging_failure_does_not_hide_results() {
        let h = harness();
        h.events.fail_append.store(true, Ordering::SeqCst);
        let mut session = SessionState::new();

        let outcome = h.flow.run_search(&keyword("cats"), &mut session, None).await;

        match outcome {
            SearchOutcome::Completed { results, trends } => {
                assert_eq!(results.len(), 2);
                assert!(trends.is_empty());
            }
            SearchOutcome::Deferred => panic!("logging failure must not defer"),
        }
        assert_eq!(session.search_count, 1);
        assert_eq!(h.events.len(), 0);
    }

    #[tokio::test]
    async fn registration_unblocks_searching() {
        let h = harness();
        let id = identity();
        let mut session = SessionState::new();
        h.flow.run_search(&keyword("cats"), &mut session, Some(&id)).await;
        assert_eq!(
            h.flow.run_search(&keyword("dogs"), &mut session, Some(&id)).await,
            SearchOutcome::Deferred
        );

        let profile = RegistrationProfile {
            phone: Some("  +998901234567 ".to_string()),
            display_name: None,
            location: Some("Toshkent".to_string()),
        };
        h.flow.register(&mut session, Some(&id), profile).await.unwrap();

        assert!(!session.pending_registration);
        assert_eq!(
            h.flow.gate().can_search(&session, Some(&id)).await,
            GateDecision::Allowed
        );

        let stored = h.users.users.lock().unwrap().clone();
        assert_eq!(
            stored,
            vec![UserRecord {
                external_id: "42".to_string(),
                phone: Some("+998901234567".to_string()),
                display_name: Some("Dilnoza".to_string()),
                location: Some("Toshkent".to_string()),
            }]
        );

        let outcome = h.flow.run_search(&keyword("dogs"), &mut session, Some(&id)).await;
        assert!(matches!(outcome, SearchOutcome::Completed { .. }));
        assert_eq!(session.search_count, 2);
    }

    #[tokio::test]
    async fn blank_profile_fields_are_stored_as_absent() {
        let h = harness();
        let id = HostIdentity {
            first_name: None,
            ..identity()
        };
        let mut session = SessionState::new();
        let profile = RegistrationProfile {
            phone: Some("   ".to_string()),
            display_name: Some("".to_string()),
            location: None,
        };
        h.flow.register(&mut session, Some(&id), profile).await.unwrap();

        let stored = h.users.users.lock().unwrap()[0].clone();
        assert_eq!(stored.phone, None);
        assert_eq!(stored.display_name, None);
        assert_eq!(stored.location, None);
    }

    #[tokio::test]
    async fn registering_twice_is_not_an_error() {
        let h = harness();
        let id = identity();
        let mut session = SessionState::new();
        h.flow
            .register(&mut session, Some(&id), RegistrationProfile::default())
            .await
            .unwrap();

        session.pending_registration = true;
        h.flow
            .register(&mut session, Some(&id), RegistrationProfile::default())
            .await
            .unwrap();

        assert!(!session.pending_registration);
        assert_eq!(h.users.users.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn store_failure_keeps_registration_pending() {
        let h = harness();
        h.users.fail_insert.store(true, Ordering::SeqCst);
        let mut session = SessionState {
            search_count: 1,
            pending_registration: true,
        };

        let err = h
            .flow
            .register(&mut session, Some(&identity()), RegistrationProfile::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::Store(PortError::Store(_))));
        assert!(session.pending_registration);
    }

    #[tokio::test]
    async fn registration_without_identity_is_rejected() {
        let h = harness();
        let mut session = SessionState {
            search_count: 1,
            pending_registration: true,
        };
        let err = h
            .flow
            .register(&mut session, None, RegistrationProfile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::MissingIdentity));
        assert!(session.pending_registration);
        assert!(h.users.users.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_event_store_still_returns_links() {
        let events = Arc::new(FakeEventStore::default());
        events.hang_append.store(true, Ordering::SeqCst);
        let settings = FlowSettings {
            store_timeout: Duration::from_millis(300),
            ..FlowSettings::default()
        };
        let flow = SearchFlow::new(events.clone(), Arc::new(FakeUserDirectory::default()), settings);
        let mut session = SessionState::new();

        let outcome = flow.run_search(&keyword("cats"), &mut session, None).await;

        let SearchOutcome::Completed { results, trends } = outcome else {
            panic!("a stalled event store must not defer the search");
        };
        assert_eq!(results.len(), 2);
        assert!(trends.is_empty());
        assert_eq!(session.search_count, 1);
        assert_eq!(events.len(), 0);
    }
}
