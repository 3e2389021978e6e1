//! Alert Evaluator
//!
//! Compares a snapshot against the configured thresholds and classifies the
//! resulting breaches against the keys that were active one cycle earlier.
//!
//! The alert list always holds every current breach. Transition sets
//! (`newly_active`, `resolved`) exist for notification only.

pub mod threshold;
pub mod types;

use std::collections::BTreeSet;

use tracing::instrument;

use market::{Snapshot, SpreadPair};

pub use self::threshold::{Breach, Threshold, ThresholdSet};
pub use self::types::{Alert, AlertKey, AlertKind, Direction};

/// Keys active after a cycle; the only alert state carried between cycles.
pub type ActiveKeys = BTreeSet<AlertKey>;

/// Result of evaluating one snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evaluation {
    /// Every breach in this snapshot, instruments first, then spreads.
    pub alerts: Vec<Alert>,

    /// Keys of `alerts`; becomes `previous` for the next cycle.
    pub active: ActiveKeys,

    /// Active now, not active in the previous cycle.
    pub newly_active: ActiveKeys,

    /// Active in the previous cycle, gone now.
    pub resolved: ActiveKeys,
}

impl Evaluation {
    /// Breaches that were already active in the previous cycle.
    pub fn still_active(&self) -> impl Iterator<Item = &AlertKey> {
        self.active.difference(&self.newly_active)
    }

    pub fn alert(&self, key: &AlertKey) -> Option<&Alert> {
        self.alerts
            .iter()
            .find(|a| a.subject == key.subject && a.direction == key.direction)
    }
}

pub struct AlertEvaluator {
    thresholds: ThresholdSet,
    spreads: Vec<SpreadPair>,
}

impl AlertEvaluator {
    pub fn new(thresholds: ThresholdSet, spreads: Vec<SpreadPair>) -> Self {
        Self { thresholds, spreads }
    }

    #[instrument(
        skip_all,
        fields(thresholds = self.thresholds.len(), previous = previous.len())
    )]
    pub fn evaluate(&self, snapshot: &Snapshot, previous: &ActiveKeys) -> Evaluation {
        evaluate(snapshot, &self.thresholds, &self.spreads, previous)
    }
}

/// Subjects without a threshold or without a price are skipped silently.
pub fn evaluate(
    snapshot: &Snapshot,
    thresholds: &ThresholdSet,
    spreads: &[SpreadPair],
    previous: &ActiveKeys,
) -> Evaluation {
    let ts = snapshot.timestamp();
    let mut alerts = Vec::new();

    for (_, name, quote) in snapshot.quotes() {
        let (Some(price), Some(t)) = (quote.price(), thresholds.get(name)) else {
            continue;
        };
        if let Some(breach) = t.check(price) {
            alerts.push(Alert::new(name, AlertKind::Instrument, price, breach, ts));
        }
    }

    for pair in spreads {
        let Some(t) = thresholds.get(&pair.name) else {
            continue;
        };
        let Some(spread) = snapshot.spread(pair) else {
            continue;
        };
        if let Some(breach) = t.check(spread) {
            alerts.push(Alert::new(&pair.name, AlertKind::Spread, spread, breach, ts));
        }
    }

    let active: ActiveKeys = alerts.iter().map(Alert::key).collect();
    let newly_active = active.difference(previous).cloned().collect();
    let resolved = previous.difference(&active).cloned().collect();

    Evaluation {
        alerts,
        active,
        newly_active,
        resolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use market::{Category, Quote};

    fn snapshot(rows: &[(Category, &str, Option<f64>)]) -> Snapshot {
        let ts = Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap();
        rows.iter().fold(Snapshot::new(ts), |snap, (cat, name, price)| {
            let q = match price {
                Some(p) => Quote::priced(*name, *p, None),
                None => Quote::failed(*name, "missing price data"),
            };
            snap.with_quote(*cat, *name, q)
        })
    }

    fn fx(name: &str, price: f64) -> (Category, &str, Option<f64>) {
        (Category::ForeignExchange, name, Some(price))
    }

    fn evaluator() -> AlertEvaluator {
        AlertEvaluator::new(
            ThresholdSet::new()
                .with("EUR/USD", 1.05, 1.15)
                .with("GBP/USD", 1.20, 1.35)
                .with("Brent-WTI", -1.0, 5.0),
            vec![SpreadPair::new(
                "Brent-WTI",
                "Brent Crude Oil",
                "WTI Crude Oil",
            )],
        )
    }

    #[test]
    fn instrument_below_min_then_resolved() {
        let ev = evaluator();

        let first = ev.evaluate(&snapshot(&[fx("EUR/USD", 1.02)]), &ActiveKeys::new());
        assert_eq!(first.alerts.len(), 1);
        let alert = &first.alerts[0];
        assert_eq!(alert.subject, "EUR/USD");
        assert_eq!(alert.kind, AlertKind::Instrument);
        assert_eq!(alert.direction, Direction::BelowMin);
        assert_eq!(alert.value, 1.02);
        assert_eq!(alert.threshold, 1.05);
        assert!(
            first
                .newly_active
                .contains(&AlertKey::new("EUR/USD", Direction::BelowMin))
        );

        let second = ev.evaluate(&snapshot(&[fx("EUR/USD", 1.10)]), &first.active);
        assert!(second.alerts.is_empty());
        assert!(second.newly_active.is_empty());
        assert_eq!(
            second.resolved.iter().collect::<Vec<_>>(),
            vec![&AlertKey::new("EUR/USD", Direction::BelowMin)]
        );
    }

    #[test]
    fn spread_above_max_is_spread_alert() {
        let snap = snapshot(&[
            (Category::Commodity, "WTI Crude Oil", Some(70.0)),
            (Category::Commodity, "Brent Crude Oil", Some(76.5)),
        ]);

        let out = evaluator().evaluate(&snap, &ActiveKeys::new());

        assert_eq!(out.alerts.len(), 1);
        let alert = &out.alerts[0];
        assert_eq!(alert.subject, "Brent-WTI");
        assert_eq!(alert.kind, AlertKind::Spread);
        assert_eq!(alert.direction, Direction::AboveMax);
        assert_eq!(alert.value, 6.5);
        assert_eq!(alert.threshold, 5.0);
    }

    #[test]
    fn missing_price_or_threshold_is_skipped() {
        let snap = snapshot(&[
            (Category::ForeignExchange, "EUR/USD", None),
            fx("USD/JPY", 400.0),
            (Category::Commodity, "WTI Crude Oil", None),
            (Category::Commodity, "Brent Crude Oil", Some(90.0)),
        ]);

        let out = evaluator().evaluate(&snap, &ActiveKeys::new());

        assert!(out.alerts.is_empty());
        assert!(out.active.is_empty());
    }

    #[test]
    fn persisting_breach_is_listed_but_not_new() {
        let ev = evaluator();
        let snap = snapshot(&[fx("GBP/USD", 1.40)]);

        let first = ev.evaluate(&snap, &ActiveKeys::new());
        let second = ev.evaluate(&snap, &first.active);

        assert_eq!(second.alerts.len(), 1);
        assert!(second.newly_active.is_empty());
        assert!(second.resolved.is_empty());
        assert_eq!(second.still_active().count(), 1);
    }

    #[test]
    fn direction_flip_is_new_key_and_resolution() {
        let ev = evaluator();

        let low = ev.evaluate(&snapshot(&[fx("GBP/USD", 1.10)]), &ActiveKeys::new());
        let high = ev.evaluate(&snapshot(&[fx("GBP/USD", 1.50)]), &low.active);

        assert!(
            high.newly_active
                .contains(&AlertKey::new("GBP/USD", Direction::AboveMax))
        );
        assert!(
            high.resolved
                .contains(&AlertKey::new("GBP/USD", Direction::BelowMin))
        );
    }

    #[test]
    fn instrument_alerts_precede_spread_alerts() {
        let snap = snapshot(&[
            fx("EUR/USD", 1.20),
            (Category::Commodity, "WTI Crude Oil", Some(80.0)),
            (Category::Commodity, "Brent Crude Oil", Some(75.0)),
        ]);

        let out = evaluator().evaluate(&snap, &ActiveKeys::new());

        let subjects: Vec<_> = out.alerts.iter().map(|a| a.subject.as_str()).collect();
        assert_eq!(subjects, vec!["EUR/USD", "Brent-WTI"]);
        assert_eq!(out.alerts[1].direction, Direction::BelowMin);
        assert_eq!(out.alerts[1].value, -5.0);
    }

    #[test]
    fn alert_serializes_wire_shape() {
        let out = evaluator().evaluate(&snapshot(&[fx("EUR/USD", 1.02)]), &ActiveKeys::new());
        let v = serde_json::to_value(&out.alerts[0]).unwrap();

        assert_eq!(v["subject"], "EUR/USD");
        assert_eq!(v["kind"], "instrument");
        assert_eq!(v["direction"], "below_min");
        assert_eq!(v["threshold"], 1.05);
        assert_eq!(v["timestamp"], "2025-06-02 14:00:00");
    }

    #[test]
    fn key_display_is_subject_and_direction() {
        let key = AlertKey::new("Brent-WTI", Direction::AboveMax);
        assert_eq!(key.to_string(), "Brent-WTI:above_max");
    }
}
