//! Product search with recent-search history.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::Result;
use crate::storage::{self, Storage, keys};
use crate::types::Product;

/// Default number of history entries kept.
pub const DEFAULT_HISTORY_CAP: usize = 10;

/// Number of queries surfaced as "recent searches".
pub const RECENT_SEARCHES: usize = 5;

/// Suggestions need at least this many characters of input.
pub const MIN_SUGGESTION_LEN: usize = 2;

/// One remembered search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub id: String,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub results_count: usize,
}

/// Where a suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    History,
    Product,
    Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub kind: SuggestionKind,
}

/// Search results, the last error, and the recent-search history.
///
/// History is most-recent first, unique by query, and never longer than its
/// cap. It is persisted under `searchHistory`.
#[derive(Debug)]
pub struct SearchStore {
    query: String,
    results: Vec<Product>,
    error: Option<String>,
    history: Vec<SearchHistoryEntry>,
    cap: usize,
    storage: Arc<dyn Storage>,
}

impl SearchStore {
    /// Load history from `storage`, keeping at most `cap` entries.
    pub fn load(storage: Arc<dyn Storage>, cap: usize) -> Self {
        let cap = cap.max(1);
        let mut history: Vec<SearchHistoryEntry> =
            storage::read(storage.as_ref(), keys::SEARCH_HISTORY)
                .and_then(|raw| {
                    serde_json::from_str(&raw)
                        .inspect_err(|e| warn!(error = %e, "Discarding unreadable search history"))
                        .ok()
                })
                .unwrap_or_default();
        history.truncate(cap);
        Self {
            query: String::new(),
            results: Vec::new(),
            error: None,
            history,
            cap,
            storage,
        }
    }

    /// Run a keyword search and remember it.
    ///
    /// On failure the error message is kept for display, results are cleared
    /// and history is left alone.
    pub async fn search(&mut self, client: &ApiClient, query: &str) -> Result<&[Product]> {
        let query = query.trim();
        self.query = query.to_owned();
        self.error = None;

        match client.products().search(query).await {
            Ok(results) => {
                debug!(query, results = results.len(), "Search completed");
                self.add_to_history(query, results.len());
                self.results = results;
                Ok(&self.results)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                self.results.clear();
                Err(e)
            }
        }
    }

    /// Record a query at the front of history, dropping any older copy.
    pub fn add_to_history(&mut self, query: &str, results_count: usize) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.history.retain(|entry| entry.query != query);
        self.history.insert(
            0,
            SearchHistoryEntry {
                id: Uuid::new_v4().to_string(),
                query: query.to_owned(),
                timestamp: Utc::now(),
                results_count,
            },
        );
        self.history.truncate(self.cap);
        self.persist();
    }

    pub fn remove_from_history(&mut self, id: &str) {
        let before = self.history.len();
        self.history.retain(|entry| entry.id != id);
        if self.history.len() != before {
            self.persist();
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.persist();
    }

    pub fn history(&self) -> &[SearchHistoryEntry] {
        &self.history
    }

    /// The most recent distinct queries.
    pub fn recent_searches(&self) -> Vec<&str> {
        self.history
            .iter()
            .take(RECENT_SEARCHES)
            .map(|entry| entry.query.as_str())
            .collect()
    }

    /// Case-insensitive matches from history, then from the current results.
    pub fn suggestions(&self, input: &str) -> Vec<Suggestion> {
        let needle = input.trim().to_lowercase();
        if needle.chars().count() < MIN_SUGGESTION_LEN {
            return Vec::new();
        }

        let candidates = self
            .history
            .iter()
            .map(|e| (e.query.as_str(), SuggestionKind::History))
            .chain(
                self.results
                    .iter()
                    .map(|p| (p.name.as_str(), SuggestionKind::Product)),
            )
            .chain(
                self.results
                    .iter()
                    .map(|p| (p.category.as_str(), SuggestionKind::Category)),
            );

        let mut out: Vec<Suggestion> = Vec::new();
        for (text, kind) in candidates {
            let lower = text.to_lowercase();
            if lower.contains(&needle) && !out.iter().any(|s| s.text.to_lowercase() == lower) {
                out.push(Suggestion {
                    text: text.to_owned(),
                    kind,
                });
            }
        }
        out
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[Product] {
        &self.results
    }

    /// Message of the last failed search.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Write failures are logged only.
    fn persist(&self) {
        let saved = serde_json::to_string(&self.history)
            .map_err(crate::storage::StorageError::from)
            .and_then(|raw| self.storage.set(keys::SEARCH_HISTORY, &raw));
        if let Err(e) = saved {
            warn!(error = %e, "Unable to save search history");
        }
    }
}
