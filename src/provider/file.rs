use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use super::SnapshotProvider;
use crate::snapshot::{parse_listings, Snapshot};

/// Replays a saved listings payload (e.g. the snapshot cache) from disk.
///
/// The file is re-read on every fetch, so replacing it between cycles feeds
/// the engine a new snapshot.
pub struct FileSnapshotProvider {
    path: PathBuf,
    convert: String,
}

impl FileSnapshotProvider {
    pub fn new(path: impl Into<PathBuf>, convert: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            convert: convert.into(),
        }
    }
}

#[async_trait]
impl SnapshotProvider for FileSnapshotProvider {
    async fn fetch(&self) -> Result<Snapshot> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read snapshot from {}", self.path.display()))?;

        // The file's modification time stands in for the fetch time.
        let fetched_at = tokio::fs::metadata(&self.path)
            .await
            .ok()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(Utc::now);

        let snapshot = parse_listings(&body, &self.convert, fetched_at)
            .with_context(|| format!("malformed snapshot in {}", self.path.display()))?;
        info!(path = %self.path.display(), records = snapshot.records.len(), "snapshot replayed");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_saved_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crypto_data.json");
        std::fs::write(
            &path,
            r#"{ "data": [ { "name": "Bitcoin", "symbol": "BTC", "quote": { "USD": { "price": 10.5 } } } ] }"#,
        )
        .unwrap();

        let provider = FileSnapshotProvider::new(&path, "USD");
        let snapshot = provider.fetch().await.unwrap();
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].price, Some(10.5));
    }

    #[tokio::test]
    async fn missing_file_is_a_provider_failure() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileSnapshotProvider::new(dir.path().join("absent.json"), "USD");
        assert!(provider.fetch().await.is_err());
    }
}
