//! crates/topic_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;

//=========================================================================================
// Platforms
//=========================================================================================

/// An external platform whose search surface the application links into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Instagram,
    Telegram,
}

impl Platform {
    /// Every supported platform, in the order result links are presented.
    pub const ALL: [Platform; 2] = [Platform::Instagram, Platform::Telegram];

    /// The tag written to the event store.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Telegram => "telegram",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::Telegram => "Telegram",
        }
    }

    /// Parses a store tag back into a platform. Matching is case-insensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(tag.trim()))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Keywords
//=========================================================================================

/// Raised when user input cannot be used as a search keyword.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Keyword must be longer than one character after trimming")]
    TooShort,
}

/// A trimmed search keyword that is known to be searchable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword(String);

impl Keyword {
    /// Trims the raw input and rejects anything of one character or less.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.chars().count() <= 1 {
            return Err(ValidationError::TooShort);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-cases and trims a keyword for trend counting.
pub fn normalize_keyword(raw: &str) -> String {
    raw.trim().to_lowercase()
}

//=========================================================================================
// Stored records
//=========================================================================================

/// One logged search against one platform. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEvent {
    pub keyword: String,
    pub platform: Platform,
    pub created_at: DateTime<Utc>,
}

/// A completed registration. `external_id` is unique across the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub external_id: String,
    pub phone: Option<String>,
    pub display_name: Option<String>,
    pub location: Option<String>,
}

//=========================================================================================
// Session and identity
//=========================================================================================

/// The identity handed over by the embedding platform at session start.
/// It is not authenticated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl HostIdentity {
    /// The opaque value the user directory is keyed by.
    pub fn external_id(&self) -> String {
        self.id.to_string()
    }
}

/// Profile fields collected by the registration prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationProfile {
    pub phone: Option<String>,
    pub display_name: Option<String>,
    pub location: Option<String>,
}

/// In-memory interaction state for one session. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    pub search_count: u32,
    pub pending_registration: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user closed the registration prompt without registering.
    pub fn dismiss_registration(&mut self) {
        self.pending_registration = false;
    }
}

//=========================================================================================
// Derived values
//=========================================================================================

/// A keyword and how often it appeared in the trend window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendEntry {
    pub keyword: String,
    pub count: u32,
}

/// A deep link into one platform's search surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLink {
    pub title: String,
    pub subtitle: String,
    pub url: String,
    pub source: Platform,
}
