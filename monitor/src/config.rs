use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use market::yahoo::client::DEFAULT_ENDPOINT;
use market::{Instrument, SpreadPair};

use crate::alerts::ThresholdSet;
use crate::error::ConfigError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    // =========================
    // Poll loop
    // =========================
    /// Time between the starts of consecutive poll cycles.
    ///
    /// Upstream data is delayed anyway; polling faster than a few seconds
    /// only burns quota.
    pub poll_interval: Duration,

    /// Upper bound for a single instrument fetch.
    ///
    /// Fetches run concurrently, so this also bounds the fetch phase of a
    /// cycle. Keep it below `poll_interval` to hold the cadence.
    pub fetch_timeout: Duration,

    /// Number of (snapshot, alerts) pairs retained for history queries.
    pub history_capacity: usize,

    // =========================
    // Collaborators
    // =========================
    /// Base URL of the chart API.
    pub quote_endpoint: String,

    /// Address the HTTP facade listens on.
    pub bind_addr: SocketAddr,

    /// What to watch and when to alert.
    pub market: MarketConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let poll_interval = Duration::from_secs(parse_var(&lookup, "POLL_INTERVAL_SECS", 5u64)?);
        let fetch_timeout = Duration::from_millis(parse_var(&lookup, "FETCH_TIMEOUT_MS", 4_000u64)?);
        let history_capacity = parse_var(&lookup, "HISTORY_CAPACITY", 100usize)?;
        let bind_addr = parse_var(
            &lookup,
            "BIND_ADDR",
            SocketAddr::from(([0, 0, 0, 0], 8000)),
        )?;
        let quote_endpoint =
            lookup("QUOTE_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let market = match lookup("MONITOR_CONFIG") {
            Some(path) => MarketConfig::from_file(&path)?,
            None => MarketConfig::default(),
        };

        let cfg = Self {
            poll_interval,
            fetch_timeout,
            history_capacity,
            quote_endpoint,
            bind_addr,
            market,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::InvalidEnv {
                key: "FETCH_TIMEOUT_MS",
                value: "0".into(),
            });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        self.market.validate()
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { key, value: raw }),
    }
}

/// Instrument table, thresholds and derived spreads.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MarketConfig {
    pub instruments: Vec<Instrument>,

    #[serde(default)]
    pub thresholds: ThresholdSet,

    #[serde(default)]
    pub spreads: Vec<SpreadPair>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            instruments: vec![
                Instrument::forex("EUR/USD", "EURUSD=X"),
                Instrument::forex("GBP/USD", "GBPUSD=X"),
                Instrument::forex("USD/JPY", "USDJPY=X"),
                Instrument::forex("USD/CHF", "USDCHF=X"),
                Instrument::commodity("WTI Crude Oil", "CL=F"),
                Instrument::commodity("Brent Crude Oil", "BZ=F"),
            ],
            thresholds: ThresholdSet::new()
                .with("Brent-WTI", -1.0, 5.0)
                .with("EUR/USD", 1.05, 1.15)
                .with("GBP/USD", 1.20, 1.35),
            spreads: vec![SpreadPair::new(
                "Brent-WTI",
                "Brent Crude Oil",
                "WTI Crude Oil",
            )],
        }
    }
}

impl MarketConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Names must be unique across categories: thresholds and spread legs
    /// refer to instruments by bare name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instruments.is_empty() {
            return Err(ConfigError::EmptyInstruments);
        }

        let mut instruments = HashSet::new();
        for inst in &self.instruments {
            if !instruments.insert(inst.name.as_str()) {
                return Err(ConfigError::DuplicateInstrument(inst.name.clone()));
            }
        }

        let mut spreads = HashSet::new();
        for pair in &self.spreads {
            if instruments.contains(pair.name.as_str()) || !spreads.insert(pair.name.as_str()) {
                return Err(ConfigError::DuplicateSubject(pair.name.clone()));
            }
            for leg in [&pair.minuend, &pair.subtrahend] {
                if !instruments.contains(leg.as_str()) {
                    return Err(ConfigError::UnknownSpreadLeg {
                        spread: pair.name.clone(),
                        leg: leg.clone(),
                    });
                }
            }
        }

        for (subject, t) in self.thresholds.iter() {
            if !instruments.contains(subject) && !spreads.contains(subject) {
                return Err(ConfigError::UnknownSubject(subject.to_string()));
            }
            if !t.is_valid() {
                return Err(ConfigError::InvalidThreshold {
                    subject: subject.to_string(),
                    min: t.min,
                    max: t.max,
                });
            }
        }

        Ok(())
    }
}
