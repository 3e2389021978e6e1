//! Market data model and collection for the spread monitor.
//!
//! Data flow:
//! QuoteSource → SnapshotBuilder → Snapshot

pub mod builder;
pub mod errors;
pub mod instrument;
pub mod quote;
pub mod snapshot;
pub mod source;
pub mod yahoo;

pub use builder::SnapshotBuilder;
pub use errors::QuoteError;
pub use instrument::{Category, Instrument};
pub use quote::Quote;
pub use snapshot::{Snapshot, SpreadPair};
pub use source::{PriceData, QuoteSource};
