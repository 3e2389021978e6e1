use std::fmt;

use serde::{Deserialize, Serialize};

/// Snapshot partition an instrument belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "forex")]
    ForeignExchange,

    #[serde(rename = "commodities")]
    Commodity,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ForeignExchange => "forex",
            Category::Commodity => "commodities",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked quotable entity, fixed at configuration time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Display name, e.g. `EUR/USD`. Thresholds and spreads refer to it.
    pub name: String,

    /// Opaque lookup key handed to the quote source, e.g. `EURUSD=X`.
    pub symbol: String,

    pub category: Category,
}

impl Instrument {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            category,
        }
    }

    pub fn forex(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::new(name, symbol, Category::ForeignExchange)
    }

    pub fn commodity(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::new(name, symbol, Category::Commodity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_as_partition_key() {
        assert_eq!(
            serde_json::to_string(&Category::ForeignExchange).unwrap(),
            "\"forex\""
        );
        assert_eq!(
            serde_json::to_string(&Category::Commodity).unwrap(),
            "\"commodities\""
        );
    }

    #[test]
    fn instrument_deserializes_from_config_shape() {
        let inst: Instrument = serde_json::from_str(
            r#"{"name":"WTI Crude Oil","symbol":"CL=F","category":"commodities"}"#,
        )
        .unwrap();
        assert_eq!(inst, Instrument::commodity("WTI Crude Oil", "CL=F"));
    }
}
