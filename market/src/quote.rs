use serde::Serialize;

use crate::source::PriceData;

/// Decimal places consumers rely on. Part of the wire contract.
pub const PRICE_DECIMALS: u32 = 5;
pub const CHANGE_DECIMALS: u32 = 5;
pub const CHANGE_PCT_DECIMALS: u32 = 3;
pub const SPREAD_DECIMALS: u32 = 3;

/// Rounds half away from zero to `decimals` places.
///
/// Magnitudes too large to scale are returned as-is; they carry no
/// fractional digits at that size anyway.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Price (or failure) for one instrument at snapshot time.
///
/// Exactly one of `price` / `error` is populated. The fields are private and
/// the only constructors are [`Quote::priced`] and [`Quote::failed`], so the
/// invariant holds for every value of this type.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quote {
    symbol: String,
    price: Option<f64>,
    previous_close: Option<f64>,
    change: Option<f64>,
    change_pct: Option<f64>,
    error: Option<String>,
}

impl Quote {
    /// Builds a priced quote with rounded derived fields.
    ///
    /// A non-finite `price` cannot be represented and yields an error quote.
    /// A non-finite previous close is dropped, as is any derived field that
    /// overflows.
    pub fn priced(symbol: impl Into<String>, price: f64, previous_close: Option<f64>) -> Self {
        let symbol = symbol.into();
        if !price.is_finite() {
            return Self::failed(symbol, format!("non-finite price {price}"));
        }

        let previous_close = previous_close.filter(|p| p.is_finite());

        let change = previous_close
            .map(|prev| price - prev)
            .filter(|c| c.is_finite());
        let change_pct = previous_close
            .zip(change)
            .filter(|(prev, _)| *prev != 0.0)
            .map(|(prev, change)| change / prev * 100.0)
            .filter(|pct| pct.is_finite());

        Self {
            symbol,
            price: Some(round_to(price, PRICE_DECIMALS)),
            previous_close: previous_close.map(|p| round_to(p, PRICE_DECIMALS)),
            change: change.map(|c| round_to(c, CHANGE_DECIMALS)),
            change_pct: change_pct.map(|c| round_to(c, CHANGE_PCT_DECIMALS)),
            error: None,
        }
    }

    /// Builds an error-only quote.
    pub fn failed(symbol: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price: None,
            previous_close: None,
            change: None,
            change_pct: None,
            error: Some(error.into()),
        }
    }

    pub fn from_price_data(symbol: impl Into<String>, data: PriceData) -> Self {
        Self::priced(symbol, data.price, data.previous_close)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn previous_close(&self) -> Option<f64> {
        self.previous_close
    }

    pub fn change(&self) -> Option<f64> {
        self.change
    }

    pub fn change_pct(&self) -> Option<f64> {
        self.change_pct
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_priced(&self) -> bool {
        self.price.is_some()
    }
}
