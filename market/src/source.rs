use async_trait::async_trait;

use crate::errors::QuoteError;

/// Raw prices returned by a quote source for one symbol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceData {
    pub price: f64,

    /// Reference price (previous close) used for change fields, when known.
    pub previous_close: Option<f64>,
}

/// Upstream price lookup.
///
/// Implementors only fetch; timeouts and error folding are applied by the
/// caller so that every source gets identical per-cycle semantics.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Stable identifier used in logs, e.g. `"YAHOO"`.
    fn id(&self) -> &'static str;

    async fn fetch(&self, symbol: &str) -> Result<PriceData, QuoteError>;
}
