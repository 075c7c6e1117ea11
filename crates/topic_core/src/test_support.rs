//! crates/topic_core/src/test_support.rs
//!
//! Scriptable in-process ports for the unit tests in this crate.

use crate::domain::{SearchEvent, UserRecord};
use crate::ports::{EventStore, PortError, PortResult, UserDirectory};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeEventStore {
    pub events: Mutex<Vec<SearchEvent>>,
    pub fail_append: AtomicBool,
    pub fail_recent: AtomicBool,
    /// Appends never complete.
    pub hang_append: AtomicBool,
}

impl FakeEventStore {
    pub fn with_events(newest_first: Vec<SearchEvent>) -> Self {
        let mut events = newest_first;
        events.reverse();
        Self {
            events: Mutex::new(events),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl EventStore for FakeEventStore {
    async fn append(&self, event: SearchEvent) -> PortResult<()> {
        if self.hang_append.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(PortError::Store("append refused".to_string()));
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> PortResult<Vec<SearchEvent>> {
        if self.fail_recent.load(Ordering::SeqCst) {
            return Err(PortError::Store("read refused".to_string()));
        }
        let events = self.events.lock().unwrap();
        Ok(events.iter().rev().take(limit).cloned().collect())
    }
}

#[derive(Default)]
pub struct FakeUserDirectory {
    pub users: Mutex<Vec<UserRecord>>,
    pub fail_lookup: AtomicBool,
    pub fail_insert: AtomicBool,
    /// Lookups never complete.
    pub hang_lookup: AtomicBool,
    pub lookups: AtomicUsize,
}

impl FakeUserDirectory {
    pub fn with_user(external_id: &str) -> Self {
        let directory = Self::default();
        directory.users.lock().unwrap().push(UserRecord {
            external_id: external_id.to_string(),
            phone: None,
            display_name: None,
            location: None,
        });
        directory
    }
}

#[async_trait]
impl UserDirectory for FakeUserDirectory {
    async fn find_by_external_id(&self, external_id: &str) -> PortResult<Option<UserRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.hang_lookup.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(PortError::Store("lookup refused".to_string()));
        }
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.external_id == external_id).cloned())
    }

    async fn insert(&self, record: UserRecord) -> PortResult<()> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(PortError::Store("insert refused".to_string()));
        }
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.external_id == record.external_id) {
            return Err(PortError::Duplicate(record.external_id));
        }
        users.push(record);
        Ok(())
    }
}
