// =============================================================================
// CoinMarketCap Listings Client
// =============================================================================
//
// GET /v1/cryptocurrency/listings/latest?start=&limit=&convert=
//
// SECURITY: The API key travels only in the `X-CMC_PRO_API_KEY` header and is
// never logged or written to disk.  The raw payload of every successful fetch
// is cached atomically so the last-seen snapshot survives a restart and can
// be replayed with the file provider.
// =============================================================================

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::{debug, info, instrument, warn};

use super::SnapshotProvider;
use crate::persistence::write_atomic;
use crate::runtime_config::RuntimeConfig;
use crate::snapshot::{parse_listings, Snapshot};

/// Listings client for the CoinMarketCap pro API.
#[derive(Clone)]
pub struct CoinMarketCapClient {
    url: String,
    start: u32,
    limit: u32,
    convert: String,
    cache_path: Option<PathBuf>,
    client: reqwest::Client,
}

impl CoinMarketCapClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Build a client from the runtime config and an API key.
    pub fn new(config: &RuntimeConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            warn!("CMC_API_KEY is empty; listings requests will be rejected");
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(val) = HeaderValue::from_str(&api_key) {
            default_headers.insert("X-CMC_PRO_API_KEY", val);
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        debug!(url = %config.listings_url, limit = config.listing_limit, "CoinMarketCapClient initialised");

        Ok(Self {
            url: config.listings_url.clone(),
            start: config.listing_start,
            limit: config.listing_limit,
            convert: config.convert.clone(),
            cache_path: config.snapshot_cache_path.clone(),
            client,
        })
    }

    // -------------------------------------------------------------------------
    // Listings
    // -------------------------------------------------------------------------

    /// Fetch the raw listings body.
    #[instrument(skip(self), name = "cmc::get_listings")]
    async fn get_listings(&self) -> Result<String> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[
                ("start", self.start.to_string()),
                ("limit", self.limit.to_string()),
                ("convert", self.convert.clone()),
            ])
            .send()
            .await
            .context("GET listings request failed")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("failed to read listings response body")?;

        if !status.is_success() {
            anyhow::bail!("listings endpoint returned {}: {}", status, body);
        }

        debug!(bytes = body.len(), "listings retrieved");
        Ok(body)
    }

    fn cache(&self, body: &str) {
        let Some(path) = &self.cache_path else {
            return;
        };
        match write_atomic(path, body.as_bytes()) {
            Ok(()) => debug!(path = %path.display(), "snapshot cached"),
            Err(e) => warn!(error = %e, "failed to cache snapshot"),
        }
    }
}

#[async_trait]
impl SnapshotProvider for CoinMarketCapClient {
    async fn fetch(&self) -> Result<Snapshot> {
        let body = self.get_listings().await?;
        self.cache(&body);

        let snapshot = parse_listings(&body, &self.convert, Utc::now())?;
        info!(records = snapshot.records.len(), "snapshot fetched");
        Ok(snapshot)
    }
}
