//! crates/topic_core/src/trends.rs
//!
//! Ranks the most searched keywords over a bounded window of recent events.

use crate::domain::{normalize_keyword, SearchEvent, TrendEntry};
use crate::ports::{bounded, EventStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_TREND_WINDOW: usize = 200;
pub const DEFAULT_TREND_TOP_K: usize = 10;

#[derive(Clone)]
pub struct TrendAggregator {
    events: Arc<dyn EventStore>,
    window_size: usize,
    top_k: usize,
    store_timeout: Duration,
}

impl TrendAggregator {
    pub fn new(
        events: Arc<dyn EventStore>,
        window_size: usize,
        top_k: usize,
        store_timeout: Duration,
    ) -> Self {
        Self {
            events,
            window_size,
            top_k,
            store_timeout,
        }
    }

    /// Recomputes the trend list from scratch.
    /// A failed store read degrades to an empty list.
    pub async fn compute_trends(&self) -> Vec<TrendEntry> {
        match bounded(self.store_timeout, self.events.recent(self.window_size)).await {
            Ok(window) => rank(&window, self.top_k),
            Err(e) => {
                warn!("Failed to read recent searches for trends: {}", e);
                Vec::new()
            }
        }
    }
}

/// Counts normalized keywords in a newest-first window and returns the `top_k`
/// most frequent. Equal counts are ordered by recency: the keyword seen most
/// recently in the window comes first.
pub fn rank(newest_first: &[SearchEvent], top_k: usize) -> Vec<TrendEntry> {
    // keyword -> (count, position of its newest occurrence)
    let mut tally: HashMap<String, (u32, usize)> = HashMap::new();
    for (position, event) in newest_first.iter().enumerate() {
        let keyword = normalize_keyword(&event.keyword);
        if keyword.is_empty() {
            continue;
        }
        tally.entry(keyword).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, u32, usize)> = tally
        .into_iter()
        .map(|(keyword, (count, newest))| (keyword, count, newest))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(top_k)
        .map(|(keyword, count, _)| TrendEntry { keyword, count })
        .collect()
}
