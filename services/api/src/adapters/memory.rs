//! services/api/src/adapters/memory.rs
//!
//! A process-local store implementing both ports. Used when no `DATABASE_URL` is
//! configured, and by the integration tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use topic_core::domain::{SearchEvent, UserRecord};
use topic_core::ports::{EventStore, PortError, PortResult, UserDirectory};

#[derive(Default)]
pub struct MemoryStore {
    /// Oldest first; `recent` reads from the back.
    searches: RwLock<Vec<SearchEvent>>,
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn append(&self, event: SearchEvent) -> PortResult<()> {
        self.searches.write().await.push(event);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> PortResult<Vec<SearchEvent>> {
        let searches = self.searches.read().await;
        Ok(searches.iter().rev().take(limit).cloned().collect())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_by_external_id(&self, external_id: &str) -> PortResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(external_id).cloned())
    }

    async fn insert(&self, record: UserRecord) -> PortResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&record.external_id) {
            return Err(PortError::Duplicate(record.external_id));
        }
        users.insert(record.external_id.clone(), record);
        Ok(())
    }
}
