use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use crate::errors::QuoteError;
use crate::source::{PriceData, QuoteSource};
use crate::yahoo::types::ChartEnvelope;

pub const DEFAULT_ENDPOINT: &str = "https://query1.finance.yahoo.com";

// The chart endpoint rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) spreadwatch/0.1";

/// Delayed quotes from the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    http: Client,
    url: String,
}

impl YahooClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, QuoteError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    #[instrument(skip(self), fields(symbol = %symbol), level = "debug")]
    pub async fn fetch_chart(&self, symbol: &str) -> Result<ChartEnvelope, QuoteError> {
        let url = format!("{}/v8/finance/chart/{}", self.url, symbol);

        let resp = self
            .http
            .get(&url)
            .query(&[("interval", "1d"), ("range", "1d")])
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Err(QuoteError::NotFound(symbol.to_string())),
            s if !s.is_success() => return Err(QuoteError::Status(s.as_u16())),
            _ => {}
        }

        let envelope: ChartEnvelope = resp.json().await?;

        debug!(
            has_result = envelope.chart.result.is_some(),
            "yahoo chart fetched"
        );

        Ok(envelope)
    }
}

#[async_trait]
impl QuoteSource for YahooClient {
    fn id(&self) -> &'static str {
        "YAHOO"
    }

    async fn fetch(&self, symbol: &str) -> Result<PriceData, QuoteError> {
        self.fetch_chart(symbol).await?.into_price_data(symbol)
    }
}
