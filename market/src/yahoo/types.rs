use serde::Deserialize;

use crate::errors::QuoteError;
use crate::source::PriceData;

/// Envelope of `GET /v8/finance/chart/{symbol}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub chart: Chart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
}

/// Only the fields the monitor needs; the rest of `meta` is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: Option<String>,
    pub currency: Option<String>,
    pub regular_market_price: Option<f64>,
    pub chart_previous_close: Option<f64>,
    pub previous_close: Option<f64>,
}

impl ChartEnvelope {
    /// Extracts last price and previous close for `symbol`.
    pub fn into_price_data(self, symbol: &str) -> Result<PriceData, QuoteError> {
        if let Some(err) = self.chart.error {
            return Err(match err.code.as_str() {
                "Not Found" => QuoteError::NotFound(symbol.to_string()),
                _ => QuoteError::InvalidResponse(format!(
                    "{}: {}",
                    err.code,
                    err.description.unwrap_or_default()
                )),
            });
        }

        let meta = self
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .map(|r| r.meta)
            .ok_or_else(|| QuoteError::MissingData(symbol.to_string()))?;

        let price = meta
            .regular_market_price
            .ok_or_else(|| QuoteError::MissingData(symbol.to_string()))?;

        Ok(PriceData {
            price,
            previous_close: meta.chart_previous_close.or(meta.previous_close),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ChartEnvelope {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn extracts_price_and_chart_previous_close() {
        let env = parse(
            r#"{"chart":{"result":[{"meta":{"symbol":"EURUSD=X","currency":"USD",
                "regularMarketPrice":1.0842,"chartPreviousClose":1.0815,
                "previousClose":1.0801,"gmtoffset":0}}],"error":null}}"#,
        );
        let data = env.into_price_data("EURUSD=X").unwrap();

        assert_eq!(data.price, 1.0842);
        assert_eq!(data.previous_close, Some(1.0815));
    }

    #[test]
    fn falls_back_to_previous_close() {
        let env = parse(
            r#"{"chart":{"result":[{"meta":{"regularMarketPrice":70.1,"previousClose":69.4}}],"error":null}}"#,
        );
        let data = env.into_price_data("CL=F").unwrap();

        assert_eq!(data.previous_close, Some(69.4));
    }

    #[test]
    fn not_found_error_maps_to_not_found() {
        let env = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        );
        let err = env.into_price_data("NOPE=X").unwrap_err();

        assert!(matches!(err, QuoteError::NotFound(s) if s == "NOPE=X"));
    }

    #[test]
    fn missing_price_is_missing_data() {
        let env = parse(r#"{"chart":{"result":[{"meta":{"symbol":"BZ=F"}}],"error":null}}"#);
        let err = env.into_price_data("BZ=F").unwrap_err();

        assert!(matches!(err, QuoteError::MissingData(_)));
    }

    #[test]
    fn empty_result_is_missing_data() {
        let env = parse(r#"{"chart":{"result":[],"error":null}}"#);

        assert!(matches!(
            env.into_price_data("X").unwrap_err(),
            QuoteError::MissingData(_)
        ));
    }
}
