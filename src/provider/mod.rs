// =============================================================================
// Snapshot Providers
// =============================================================================
//
// Where each cycle's listings come from.  The engine only depends on the
// `SnapshotProvider` capability; an `Err` means "no snapshot this cycle".

pub mod coinmarketcap;
pub mod file;

use async_trait::async_trait;

use crate::snapshot::Snapshot;

pub use coinmarketcap::CoinMarketCapClient;
pub use file::FileSnapshotProvider;

#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Retrieve the current listings snapshot.
    async fn fetch(&self) -> anyhow::Result<Snapshot>;
}
