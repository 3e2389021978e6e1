use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use market::Snapshot;

use crate::alerts::Alert;
use crate::store::{HistoryEntry, StateStore};

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Loading,
}

#[derive(Clone, Debug, Serialize)]
pub struct PricesResponse {
    pub status: Status,
    pub data: Option<Arc<Snapshot>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AlertsResponse {
    pub status: Status,
    pub count: usize,
    pub alerts: Arc<[Alert]>,
}

#[derive(Clone, Debug, Serialize)]
pub struct HistoryResponse {
    pub status: Status,
    pub count: usize,
    pub snapshots: Vec<HistoryEntry>,
}

#[derive(Clone, Debug, Serialize)]
pub struct HealthResponse {
    pub status: Status,
    pub timestamp: String,
}

/// Read-only view of the monitor's state for transports.
#[derive(Clone)]
pub struct QueryFacade {
    store: StateStore,
}

impl QueryFacade {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// `loading` until the first cycle has been published.
    pub fn get_latest_prices(&self) -> PricesResponse {
        match self.store.read_latest() {
            Ok(latest) => PricesResponse {
                status: Status::Ok,
                data: Some(latest.snapshot),
            },
            Err(_) => PricesResponse {
                status: Status::Loading,
                data: None,
            },
        }
    }

    pub fn get_active_alerts(&self) -> AlertsResponse {
        let alerts = self.store.read_alerts();
        AlertsResponse {
            status: Status::Ok,
            count: alerts.len(),
            alerts,
        }
    }

    pub fn get_history(&self, limit: Option<usize>) -> HistoryResponse {
        let snapshots = self
            .store
            .read_history(limit.unwrap_or(DEFAULT_HISTORY_LIMIT));
        HistoryResponse {
            status: Status::Ok,
            count: snapshots.len(),
            snapshots,
        }
    }

    /// Liveness of the process only; says nothing about the poll loop.
    pub fn health_check(&self) -> HealthResponse {
        HealthResponse {
            status: Status::Ok,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
