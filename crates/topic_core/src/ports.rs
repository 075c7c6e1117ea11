//! crates/topic_core/src/ports.rs
//!
//! Defines the store contracts (traits) the core logic depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete store behind them.

use crate::domain::{SearchEvent, UserRecord};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external stores (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Store error: {0}")]
    Store(String),
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Duplicate record: {0}")]
    Duplicate(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Runs a store call with an upper bound on how long it may take.
/// An elapsed timeout is reported as `PortError::Timeout`.
pub async fn bounded<T, F>(limit: Duration, call: F) -> PortResult<T>
where
    F: Future<Output = PortResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(PortError::Timeout(limit)),
    }
}

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

/// Append-only log of search events.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append(&self, event: SearchEvent) -> PortResult<()>;

    /// Returns at most `limit` events, newest first.
    async fn recent(&self, limit: usize) -> PortResult<Vec<SearchEvent>>;
}

/// Registration records keyed by the host platform's external id.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_external_id(&self, external_id: &str) -> PortResult<Option<UserRecord>>;

    /// Fails with `PortError::Duplicate` when the external id is already registered.
    async fn insert(&self, record: UserRecord) -> PortResult<()>;
}
