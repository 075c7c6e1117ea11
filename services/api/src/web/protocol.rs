//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the mini-app client and the API server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use topic_core::domain::{HostIdentity, RegistrationProfile, ResultLink, TrendEntry};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Payloads Sent FROM the Client TO the Server
//=========================================================================================

/// The user object handed to the mini-app by the embedding platform.
#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct HostIdentityPayload {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl From<HostIdentityPayload> for HostIdentity {
    fn from(payload: HostIdentityPayload) -> Self {
        HostIdentity {
            id: payload.id,
            first_name: payload.first_name,
            last_name: payload.last_name,
            username: payload.username,
        }
    }
}

/// Starts a session. The identity is optional; the host may not provide one.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct StartSessionRequest {
    #[serde(default)]
    pub identity: Option<HostIdentityPayload>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SearchRequest {
    pub keyword: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Falls back to the host identity's first name.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl From<RegisterRequest> for RegistrationProfile {
    fn from(req: RegisterRequest) -> Self {
        RegistrationProfile {
            phone: req.phone,
            display_name: req.display_name,
            location: req.location,
        }
    }
}

//=========================================================================================
// Payloads Sent FROM the Server TO the Client
//=========================================================================================

#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct SessionView {
    pub session_id: Uuid,
    pub search_count: u32,
    pub pending_registration: bool,
    pub has_identity: bool,
    pub started_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct ResultLinkView {
    pub title: String,
    pub subtitle: String,
    pub url: String,
    /// Display name of the platform, e.g. `Instagram`.
    pub source: String,
}

impl From<ResultLink> for ResultLinkView {
    fn from(link: ResultLink) -> Self {
        ResultLinkView {
            title: link.title,
            subtitle: link.subtitle,
            url: link.url,
            source: link.source.display_name().to_string(),
        }
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct TrendView {
    pub keyword: String,
    pub count: u32,
}

impl From<TrendEntry> for TrendView {
    fn from(entry: TrendEntry) -> Self {
        TrendView {
            keyword: entry.keyword,
            count: entry.count,
        }
    }
}

/// The result of a search request.
#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchResponse {
    /// The search ran; `trends` already includes it.
    Completed {
        results: Vec<ResultLinkView>,
        trends: Vec<TrendView>,
        search_count: u32,
    },
    /// The client should show the registration prompt.
    RegistrationRequired { search_count: u32 },
}
