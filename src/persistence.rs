// =============================================================================
// State Persistence — symbol -> AssetState across restarts
// =============================================================================
//
// The engine sees persistence only through the `StateStore` capability.  The
// production implementation writes pretty JSON with an atomic tmp + rename
// so a crash mid-write never leaves a truncated state file.  A missing file
// is a cold start, not an error.
// =============================================================================

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::history::AssetState;

/// Load / save boundary for the per-symbol state map.
pub trait StateStore: Send + Sync {
    /// Return the persisted map, or an empty map when nothing was saved yet.
    fn load(&self) -> Result<BTreeMap<String, AssetState>>;

    fn save(&self, assets: &BTreeMap<String, AssetState>) -> Result<()>;
}

/// Write `content` to `path` via a `.tmp` sibling and a rename.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    std::fs::write(&tmp_path, content)
        .with_context(|| format!("failed to write tmp file {}", tmp_path.display()))?;

    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename tmp file to {}", path.display()))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// `StateStore` backed by a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<BTreeMap<String, AssetState>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no saved state, starting cold");
                return Ok(BTreeMap::new());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read state from {}", self.path.display())
                })
            }
        };

        let assets: BTreeMap<String, AssetState> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse state from {}", self.path.display()))?;

        info!(path = %self.path.display(), assets = assets.len(), "state loaded");
        Ok(assets)
    }

    fn save(&self, assets: &BTreeMap<String, AssetState>) -> Result<()> {
        let content =
            serde_json::to_string_pretty(assets).context("failed to serialise state to JSON")?;
        write_atomic(&self.path, content.as_bytes())?;
        info!(path = %self.path.display(), assets = assets.len(), "state saved (atomic)");
        Ok(())
    }
}
