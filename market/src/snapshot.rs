use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::instrument::Category;
use crate::quote::{Quote, SPREAD_DECIMALS, round_to};

/// Wire format of snapshot timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One consistent, timestamped set of quotes across all instruments.
///
/// Immutable once the builder hands it out; the store shares it behind `Arc`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: DateTime<Utc>,
    forex: BTreeMap<String, Quote>,
    commodities: BTreeMap<String, Quote>,
}

/// Serializes a timestamp in [`TIMESTAMP_FORMAT`]; for `#[serde(serialize_with)]`.
pub fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

impl Snapshot {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            forex: BTreeMap::new(),
            commodities: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, category: Category, name: impl Into<String>, quote: Quote) {
        self.partition_mut(category).insert(name.into(), quote);
    }

    /// Builder-style variant of [`Snapshot::insert`].
    pub fn with_quote(mut self, category: Category, name: impl Into<String>, quote: Quote) -> Self {
        self.insert(category, name, quote);
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn partition(&self, category: Category) -> &BTreeMap<String, Quote> {
        match category {
            Category::ForeignExchange => &self.forex,
            Category::Commodity => &self.commodities,
        }
    }

    fn partition_mut(&mut self, category: Category) -> &mut BTreeMap<String, Quote> {
        match category {
            Category::ForeignExchange => &mut self.forex,
            Category::Commodity => &mut self.commodities,
        }
    }

    /// All quotes: forex first, then commodities, each in name order.
    pub fn quotes(&self) -> impl Iterator<Item = (Category, &str, &Quote)> {
        let fx = self
            .forex
            .iter()
            .map(|(n, q)| (Category::ForeignExchange, n.as_str(), q));
        let cmd = self
            .commodities
            .iter()
            .map(|(n, q)| (Category::Commodity, n.as_str(), q));
        fx.chain(cmd)
    }

    /// Looks an instrument up by name in either partition.
    pub fn quote(&self, name: &str) -> Option<&Quote> {
        self.forex.get(name).or_else(|| self.commodities.get(name))
    }

    pub fn price(&self, name: &str) -> Option<f64> {
        self.quote(name).and_then(Quote::price)
    }

    /// Derived spread for `pair`, undefined when either leg has no price or
    /// the difference overflows.
    pub fn spread(&self, pair: &SpreadPair) -> Option<f64> {
        let minuend = self.price(&pair.minuend)?;
        let subtrahend = self.price(&pair.subtrahend)?;
        let spread = minuend - subtrahend;
        spread
            .is_finite()
            .then(|| round_to(spread, SPREAD_DECIMALS))
    }

    pub fn len(&self) -> usize {
        self.forex.len() + self.commodities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn failed_count(&self) -> usize {
        self.quotes().filter(|(_, _, q)| !q.is_priced()).count()
    }
}

/// Derived spread `minuend - subtrahend`, e.g. `Brent-WTI`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadPair {
    /// Subject name; thresholds for this spread are keyed by it.
    pub name: String,
    pub minuend: String,
    pub subtrahend: String,
}

impl SpreadPair {
    pub fn new(
        name: impl Into<String>,
        minuend: impl Into<String>,
        subtrahend: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            minuend: minuend.into(),
            subtrahend: subtrahend.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 5).unwrap()
    }

    fn oil(wti: Option<f64>, brent: Option<f64>) -> Snapshot {
        let leg = |sym: &str, p: Option<f64>| match p {
            Some(p) => Quote::priced(sym, p, None),
            None => Quote::failed(sym, "missing price data"),
        };
        Snapshot::new(ts())
            .with_quote(Category::Commodity, "WTI Crude Oil", leg("CL=F", wti))
            .with_quote(Category::Commodity, "Brent Crude Oil", leg("BZ=F", brent))
    }

    fn brent_wti() -> SpreadPair {
        SpreadPair::new("Brent-WTI", "Brent Crude Oil", "WTI Crude Oil")
    }

    #[test]
    fn spread_is_minuend_minus_subtrahend_rounded() {
        let snap = oil(Some(70.0), Some(76.5));
        assert_eq!(snap.spread(&brent_wti()), Some(6.5));

        let snap = oil(Some(70.12345), Some(69.0));
        assert_eq!(snap.spread(&brent_wti()), Some(-1.123));
    }

    #[test]
    fn spread_undefined_without_both_prices() {
        assert_eq!(oil(None, Some(76.5)).spread(&brent_wti()), None);
        assert_eq!(oil(Some(70.0), None).spread(&brent_wti()), None);
    }

    #[test]
    fn spread_undefined_on_overflow() {
        assert_eq!(oil(Some(-f64::MAX), Some(f64::MAX)).spread(&brent_wti()), None);
    }

    #[test]
    fn serializes_partitioned_with_wire_timestamp() {
        let snap = oil(Some(70.0), Some(76.5)).with_quote(
            Category::ForeignExchange,
            "EUR/USD",
            Quote::priced("EURUSD=X", 1.1, Some(1.0)),
        );
        let v = serde_json::to_value(&snap).unwrap();

        assert_eq!(v["timestamp"], "2025-03-14 09:30:05");
        assert_eq!(v["forex"]["EUR/USD"]["price"], 1.1);
        assert_eq!(v["commodities"]["WTI Crude Oil"]["symbol"], "CL=F");
    }

    #[test]
    fn quotes_iterates_forex_then_commodities() {
        let snap = oil(Some(70.0), None).with_quote(
            Category::ForeignExchange,
            "USD/JPY",
            Quote::priced("USDJPY=X", 150.0, None),
        );
        let order: Vec<_> = snap.quotes().map(|(c, n, _)| (c, n.to_string())).collect();

        assert_eq!(order[0], (Category::ForeignExchange, "USD/JPY".to_string()));
        assert_eq!(order[1], (Category::Commodity, "Brent Crude Oil".to_string()));
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.failed_count(), 1);
    }
}
