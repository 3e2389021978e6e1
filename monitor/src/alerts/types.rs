use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use market::snapshot::serialize_timestamp;

use super::threshold::Breach;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    BelowMin,
    AboveMax,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::BelowMin => "below_min",
            Direction::AboveMax => "above_max",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Price of a single instrument outside its band.
    Instrument,

    /// Derived spread outside its band.
    Spread,
}

/// A currently active threshold breach. Rebuilt from scratch every cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Alert {
    pub subject: String,
    pub kind: AlertKind,
    pub value: f64,
    pub threshold: f64,
    pub direction: Direction,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        subject: impl Into<String>,
        kind: AlertKind,
        value: f64,
        breach: Breach,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            subject: subject.into(),
            kind,
            value,
            threshold: breach.bound,
            direction: breach.direction,
            timestamp,
        }
    }

    pub fn key(&self) -> AlertKey {
        AlertKey {
            subject: self.subject.clone(),
            direction: self.direction,
        }
    }
}

/// Identity of a breach for transition detection between cycles.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertKey {
    pub subject: String,
    pub direction: Direction,
}

impl AlertKey {
    pub fn new(subject: impl Into<String>, direction: Direction) -> Self {
        Self {
            subject: subject.into(),
            direction,
        }
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject, self.direction)
    }
}
