//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `EventStore` and `UserDirectory` ports from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use topic_core::domain::{Platform, SearchEvent, UserRecord};
use topic_core::ports::{EventStore, PortError, PortResult, UserDirectory};
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements both store ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn store_error(e: sqlx::Error) -> PortError {
    PortError::Store(e.to_string())
}

/// Platform tags the trend window reads. Rows with any other tag stay in the
/// table but are filtered before `LIMIT`, so they never take a window slot.
fn known_platform_tags() -> Vec<String> {
    Platform::ALL.iter().map(|p| p.as_str().to_string()).collect()
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SearchRecord {
    keyword: String,
    platform: String,
    created_at: DateTime<Utc>,
}
impl SearchRecord {
    fn to_domain(self) -> Option<SearchEvent> {
        let Some(platform) = Platform::from_tag(&self.platform) else {
            warn!("Skipping search row with unknown platform '{}'", self.platform);
            return None;
        };
        Some(SearchEvent {
            keyword: self.keyword,
            platform,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct UserRow {
    external_id: String,
    phone: Option<String>,
    display_name: Option<String>,
    location: Option<String>,
}
impl UserRow {
    fn to_domain(self) -> UserRecord {
        UserRecord {
            external_id: self.external_id,
            phone: self.phone,
            display_name: self.display_name,
            location: self.location,
        }
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl EventStore for DbAdapter {
    async fn append(&self, event: SearchEvent) -> PortResult<()> {
        sqlx::query("INSERT INTO searches (keyword, platform, created_at) VALUES ($1, $2, $3)")
            .bind(&event.keyword)
            .bind(event.platform.as_str())
            .bind(event.created_at)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> PortResult<Vec<SearchEvent>> {
        let records = sqlx::query_as::<_, SearchRecord>(
            "SELECT keyword, platform, created_at FROM searches \
             WHERE lower(trim(platform)) = ANY($1) \
             ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(known_platform_tags())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        let events = records.into_iter().filter_map(|r| r.to_domain()).collect();
        Ok(events)
    }
}

#[async_trait]
impl UserDirectory for DbAdapter {
    async fn find_by_external_id(&self, external_id: &str) -> PortResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRow>(
            "SELECT external_id, phone, display_name, location FROM users WHERE external_id = $1",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn insert(&self, record: UserRecord) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO users (external_id, phone, display_name, location) VALUES ($1, $2, $3, $4)",
        )
        .bind(&record.external_id)
        .bind(&record.phone)
        .bind(&record.display_name)
        .bind(&record.location)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::Duplicate(record.external_id.clone())
            }
            _ => store_error(e),
        })?;
        Ok(())
    }
}
