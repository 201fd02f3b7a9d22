//! Per-workspace storage of upload summaries.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use lead_model::Category;

use crate::summary::DataSummary;

/// How long a summary stays readable after it was stored.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Entries kept before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 1024;
/// Context text returned when a workspace has no live summaries.
pub const NO_DATA_CONTEXT: &str = "No data available for this workspace.";

/// Keeps the latest summary per `(workspace, category)`.
pub trait SummaryStore: Send + Sync {
    /// Stores `summary` under its own category, replacing any previous one.
    fn put(&self, workspace: &str, summary: DataSummary);

    /// Returns the live summary for the pair, if any.
    fn get(&self, workspace: &str, category: Category) -> Option<DataSummary>;

    /// Removes the summary for the pair.
    ///
    /// Returns whether an entry was removed.
    fn remove(&self, workspace: &str, category: Category) -> bool;

    /// Drops expired entries and returns how many were dropped.
    fn evict_expired(&self) -> usize;

    /// Question-answering context for a workspace: the buyers block, then
    /// the visitors block, separated by a blank line.
    ///
    /// Returns [`NO_DATA_CONTEXT`] when neither category is stored.
    fn context_for(&self, workspace: &str) -> String {
        let blocks: Vec<String> = Category::ALL
            .into_iter()
            .filter_map(|category| self.get(workspace, category))
            .map(|summary| summary.to_context())
            .collect();
        if blocks.is_empty() {
            NO_DATA_CONTEXT.to_string()
        } else {
            blocks.join("\n\n")
        }
    }
}

/// Limits applied by [`InMemorySummaryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Entries this old are treated as absent.
    pub ttl: Duration,
    /// Oldest entries are evicted beyond this many.
    pub capacity: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug)]
struct Entry {
    summary: DataSummary,
    stored_at: Instant,
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<(String, Category), Entry>,
    next_seq: u64,
}

/// Process-local [`SummaryStore`] behind a mutex.
#[derive(Debug, Default)]
pub struct InMemorySummaryStore {
    options: StoreOptions,
    inner: Mutex<Inner>,
}

impl InMemorySummaryStore {
    /// Empty store with the given limits.
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Limits this store was built with.
    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Live and expired entries currently held.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// True when no entries are held, live or expired.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.stored_at) >= self.options.ttl
    }
}

impl SummaryStore for InMemorySummaryStore {
    fn put(&self, workspace: &str, summary: DataSummary) {
        let key = (workspace.to_string(), summary.category);
        let mut inner = self.lock();
        if self.options.capacity == 0 {
            return;
        }
        if !inner.entries.contains_key(&key) {
            while inner.entries.len() >= self.options.capacity {
                let Some(oldest) = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.seq)
                    .map(|(key, _)| key.clone())
                else {
                    break;
                };
                debug!(workspace = %oldest.0, category = %oldest.1, "evicting oldest summary");
                inner.entries.remove(&oldest);
            }
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        debug!(
            workspace,
            category = %summary.category,
            rows = summary.total_rows,
            "summary stored"
        );
        inner.entries.insert(
            key,
            Entry {
                summary,
                stored_at: Instant::now(),
                seq,
            },
        );
    }

    fn get(&self, workspace: &str, category: Category) -> Option<DataSummary> {
        let key = (workspace.to_string(), category);
        let mut inner = self.lock();
        let expired = self.is_expired(inner.entries.get(&key)?, Instant::now());
        if expired {
            inner.entries.remove(&key);
            return None;
        }
        inner.entries.get(&key).map(|entry| entry.summary.clone())
    }

    fn remove(&self, workspace: &str, category: Category) -> bool {
        self.lock()
            .entries
            .remove(&(workspace.to_string(), category))
            .is_some()
    }

    fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, entry| now.duration_since(entry.stored_at) < self.options.ttl);
        before - inner.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use lead_model::Table;

    use super::*;

    fn summary(category: Category) -> DataSummary {
        DataSummary::from_table(category, &Table::new(vec!["email".into()]))
    }

    #[test]
    fn put_then_get_by_category() {
        let store = InMemorySummaryStore::default();
        store.put("w1", summary(Category::Buyers));
        assert!(store.get("w1", Category::Buyers).is_some());
        assert!(store.get("w1", Category::Visitors).is_none());
        assert!(store.get("w2", Category::Buyers).is_none());
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let store = InMemorySummaryStore::new(StoreOptions {
            ttl: Duration::ZERO,
            capacity: 8,
        });
        store.put("w1", summary(Category::Buyers));
        store.put("w2", summary(Category::Buyers));
        assert_eq!(store.evict_expired(), 2);
        store.put("w1", summary(Category::Buyers));
        assert!(store.get("w1", Category::Buyers).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let store = InMemorySummaryStore::new(StoreOptions {
            ttl: DEFAULT_TTL,
            capacity: 2,
        });
        store.put("a", summary(Category::Buyers));
        store.put("b", summary(Category::Buyers));
        // Replacing an existing key does not evict.
        store.put("a", summary(Category::Buyers));
        assert_eq!(store.len(), 2);
        store.put("c", summary(Category::Buyers));
        assert_eq!(store.len(), 2);
        assert!(store.get("b", Category::Buyers).is_none());
        assert!(store.get("a", Category::Buyers).is_some());
        assert!(store.get("c", Category::Buyers).is_some());
    }

    #[test]
    fn context_lists_buyers_before_visitors() {
        let store = InMemorySummaryStore::default();
        assert_eq!(store.context_for("w"), NO_DATA_CONTEXT);

        store.put("w", summary(Category::Visitors));
        store.put("w", summary(Category::Buyers));
        let context = store.context_for("w");
        let buyers = context.find("=== Buyers Data ===").expect("buyers block");
        let visitors = context.find("=== Visitors Data ===").expect("visitors block");
        assert!(buyers < visitors);
        assert!(context.contains("\n\n=== Visitors Data ==="));
        assert_eq!(store.context_for("other"), NO_DATA_CONTEXT);
    }

    #[test]
    fn remove_reports_presence() {
        let store = InMemorySummaryStore::default();
        store.put("w", summary(Category::Visitors));
        assert!(store.remove("w", Category::Visitors));
        assert!(!store.remove("w", Category::Visitors));
    }
}
