use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::Direction;

/// Inclusive band `[min, max]`; only values strictly outside it breach.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub min: f64,
    pub max: f64,
}

/// Which side of a threshold was crossed, and the bound that was crossed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Breach {
    pub direction: Direction,
    pub bound: f64,
}

impl Threshold {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `min < max` with both bounds finite.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }

    pub fn check(&self, value: f64) -> Option<Breach> {
        if value < self.min {
            Some(Breach {
                direction: Direction::BelowMin,
                bound: self.min,
            })
        } else if value > self.max {
            Some(Breach {
                direction: Direction::AboveMax,
                bound: self.max,
            })
        } else {
            None
        }
    }
}

/// Thresholds keyed by subject (instrument name or spread name).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdSet(BTreeMap<String, Threshold>);

impl ThresholdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, subject: impl Into<String>, min: f64, max: f64) -> Self {
        self.0.insert(subject.into(), Threshold::new(min, max));
        self
    }

    pub fn get(&self, subject: &str) -> Option<&Threshold> {
        self.0.get(subject)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Threshold)> {
        self.0.iter().map(|(s, t)| (s.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]
        #[test]
        fn direction_matches_violated_bound(
            min in -1.0e4..1.0e4f64,
            width in 1.0e-6..1.0e4f64,
            value in -3.0e4..3.0e4f64,
        ) {
            let t = Threshold::new(min, min + width);
            prop_assume!(t.is_valid());

            match t.check(value) {
                None => prop_assert!(value >= t.min && value <= t.max),
                Some(b) => match b.direction {
                    Direction::BelowMin => {
                        prop_assert!(value < t.min);
                        prop_assert_eq!(b.bound, t.min);
                    }
                    Direction::AboveMax => {
                        prop_assert!(value > t.max);
                        prop_assert_eq!(b.bound, t.max);
                    }
                },
            }
        }
    }
}
