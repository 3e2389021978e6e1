//! Snapshot Builder
//!
//! Runs one fetch pass across every configured instrument and assembles a
//! single immutable `Snapshot`. A failing or slow instrument only affects its
//! own quote: it is recorded as an error quote and the pass continues.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use common::logger::warn_if_slow;

use crate::errors::QuoteError;
use crate::instrument::Instrument;
use crate::quote::Quote;
use crate::snapshot::Snapshot;
use crate::source::QuoteSource;

pub struct SnapshotBuilder {
    source: Arc<dyn QuoteSource>,
    instruments: Vec<Instrument>,
    fetch_timeout: Duration,
}

impl SnapshotBuilder {
    pub fn new(
        source: Arc<dyn QuoteSource>,
        instruments: Vec<Instrument>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            instruments,
            fetch_timeout,
        }
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Fetches every instrument once and returns the resulting snapshot.
    ///
    /// The timestamp is taken before the first fetch and is shared by all
    /// quotes. Fetches run concurrently, each bounded by `fetch_timeout`.
    #[instrument(
        name = "snapshot_build",
        skip(self),
        fields(source = self.source.id(), instruments = self.instruments.len())
    )]
    pub async fn build(&self) -> Snapshot {
        let mut snapshot = Snapshot::new(Utc::now());

        let fetches = self.instruments.iter().map(|inst| self.fetch_one(inst));
        let quotes = warn_if_slow(
            "snapshot_build",
            self.fetch_timeout + Duration::from_millis(250),
            join_all(fetches),
        )
        .await;

        for (inst, quote) in self.instruments.iter().zip(quotes) {
            snapshot.insert(inst.category, inst.name.clone(), quote);
        }

        debug!(
            quotes = snapshot.len(),
            failed = snapshot.failed_count(),
            "snapshot built"
        );

        snapshot
    }

    async fn fetch_one(&self, inst: &Instrument) -> Quote {
        let outcome = match timeout(self.fetch_timeout, self.source.fetch(&inst.symbol)).await {
            Ok(res) => res,
            Err(_) => Err(QuoteError::Timeout(self.fetch_timeout)),
        };

        match outcome {
            Ok(data) => Quote::from_price_data(inst.symbol.clone(), data),
            Err(e) => {
                warn!(
                    instrument = %inst.name,
                    symbol = %inst.symbol,
                    error = %e,
                    "quote fetch failed"
                );
                Quote::failed(inst.symbol.clone(), e.to_string())
            }
        }
    }
}
