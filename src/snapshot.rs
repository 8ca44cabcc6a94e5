// =============================================================================
// Price Snapshot — one polling cycle's listings
// =============================================================================
//
// Listings arrive as loosely-shaped JSON:
//
//   { "data": [ { "name": "Bitcoin", "symbol": "BTC",
//                 "quote": { "USD": { "price": 67000.1 } } }, ... ] }
//
// The envelope shape is mandatory (a missing or non-array `data` rejects the
// whole payload).  Individual entries are parsed leniently into
// `SnapshotRecord`s whose fields are all optional; records missing any field
// are skipped later by the classifier.
// =============================================================================

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

/// One listing entry with every field optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotRecord {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub price: Option<f64>,
}

/// A record whose required fields are all present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote<'a> {
    pub name: &'a str,
    pub symbol: &'a str,
    pub price: f64,
}

impl SnapshotRecord {
    #[cfg(test)]
    pub fn new(name: &str, symbol: &str, price: f64) -> Self {
        Self {
            name: Some(name.to_string()),
            symbol: Some(symbol.to_string()),
            price: Some(price),
        }
    }

    /// All required fields, or `None` if any is missing.  Non-finite prices
    /// count as missing.
    pub fn quote(&self) -> Option<Quote<'_>> {
        let price = self.price.filter(|p| p.is_finite())?;
        Some(Quote {
            name: self.name.as_deref()?,
            symbol: self.symbol.as_deref()?,
            price,
        })
    }
}

/// Ordered listings for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,
    pub records: Vec<SnapshotRecord>,
}

impl Snapshot {
    pub fn new(fetched_at: DateTime<Utc>, records: Vec<SnapshotRecord>) -> Self {
        Self {
            fetched_at,
            records,
        }
    }
}

// ---------------------------------------------------------------------------
// Listings payload parsing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ListingsEnvelope {
    data: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawListing {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    quote: HashMap<String, RawQuote>,
}

#[derive(Deserialize)]
struct RawQuote {
    #[serde(default)]
    price: Option<f64>,
}

/// Parse a listings payload, reading prices from `quote.<convert>.price`.
///
/// Fails only when the envelope itself is malformed; entries that do not
/// fit the expected shape become empty records.
pub fn parse_listings(body: &str, convert: &str, fetched_at: DateTime<Utc>) -> Result<Snapshot> {
    let envelope: ListingsEnvelope =
        serde_json::from_str(body).context("listings payload missing a 'data' array")?;

    let records = envelope
        .data
        .into_iter()
        .enumerate()
        .map(|(i, entry)| match serde_json::from_value::<RawListing>(entry) {
            Ok(raw) => {
                let price = raw.quote.get(convert).and_then(|q| q.price);
                SnapshotRecord {
                    name: raw.name,
                    symbol: raw.symbol,
                    price,
                }
            }
            Err(e) => {
                debug!(index = i, error = %e, "listing entry has unexpected shape");
                SnapshotRecord::default()
            }
        })
        .collect();

    Ok(Snapshot::new(fetched_at, records))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
