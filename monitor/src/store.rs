//! State Store
//!
//! Latest snapshot, latest alerts and a bounded history ring behind a single
//! lock. The poll loop owns the only [`StatePublisher`]; everything else
//! holds a cloneable, read-only [`StateStore`].

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use market::Snapshot;

use crate::alerts::Alert;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("no snapshot published yet")]
    NotYetAvailable,
}

/// A snapshot together with the alerts computed from it, as published in
/// one call. Used both for the latest state and for history entries.
#[derive(Clone, Debug, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub snapshot: Arc<Snapshot>,
    pub alerts: Arc<[Alert]>,
}

impl HistoryEntry {
    /// Same publish, regardless of which read returned it.
    pub fn same_publish(&self, other: &HistoryEntry) -> bool {
        Arc::ptr_eq(&self.snapshot, &other.snapshot) && Arc::ptr_eq(&self.alerts, &other.alerts)
    }
}

struct Inner {
    latest: Option<HistoryEntry>,
    history: VecDeque<HistoryEntry>,
    capacity: usize,
    published: u64,
}

/// Creates the single writer and a reader handle over shared state.
///
/// `capacity` is the history ring size; values below 1 are raised to 1.
pub fn channel(capacity: usize) -> (StatePublisher, StateStore) {
    let capacity = capacity.max(1);
    let inner = Arc::new(Mutex::new(Inner {
        latest: None,
        history: VecDeque::with_capacity(capacity),
        capacity,
        published: 0,
    }));

    (
        StatePublisher {
            inner: Arc::clone(&inner),
        },
        StateStore { inner },
    )
}

/// Write side. Deliberately not `Clone`.
pub struct StatePublisher {
    inner: Arc<Mutex<Inner>>,
}

impl StatePublisher {
    /// Replaces latest state and appends to history in one critical section.
    pub fn publish(&mut self, snapshot: Snapshot, alerts: Vec<Alert>) {
        let entry = HistoryEntry {
            snapshot: Arc::new(snapshot),
            alerts: Arc::from(alerts),
        };

        let mut g = self.inner.lock();
        if g.history.len() >= g.capacity {
            g.history.pop_front();
        }
        g.history.push_back(entry.clone());
        g.latest = Some(entry);
        g.published += 1;

        debug!(
            published = g.published,
            history_len = g.history.len(),
            "state published"
        );
    }
}

/// Read side. Every read copies out `Arc`s and releases the lock.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<Mutex<Inner>>,
}

impl StateStore {
    pub fn read_latest(&self) -> Result<HistoryEntry, StoreError> {
        self.inner
            .lock()
            .latest
            .clone()
            .ok_or(StoreError::NotYetAvailable)
    }

    /// Alerts from the latest publish; empty before the first one.
    pub fn read_alerts(&self) -> Arc<[Alert]> {
        self.inner
            .lock()
            .latest
            .as_ref()
            .map(|e| Arc::clone(&e.alerts))
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Most recent `limit` entries, oldest first, newest last.
    pub fn read_history(&self, limit: usize) -> Vec<HistoryEntry> {
        let g = self.inner.lock();
        let n = limit.min(g.history.len());
        g.history.iter().skip(g.history.len() - n).cloned().collect()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Total publishes since start, including evicted ones.
    pub fn published_count(&self) -> u64 {
        self.inner.lock().published
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]
        #[test]
        fn history_never_exceeds_capacity(
            capacity in 1usize..50,
            publishes in 0usize..200,
            limit in 0usize..300,
        ) {
            let (mut publisher, store) = channel(capacity);
            for _ in 0..publishes {
                publisher.publish(Snapshot::new(Utc::now()), vec![]);
            }

            let history = store.read_history(limit);
            prop_assert!(history.len() <= capacity);
            prop_assert_eq!(history.len(), limit.min(publishes).min(capacity));
            prop_assert_eq!(store.published_count(), publishes as u64);

            if publishes > 0 && limit > 0 {
                let latest = store.read_latest().unwrap();
                prop_assert!(history.last().unwrap().same_publish(&latest));
            }
        }
    }
}
