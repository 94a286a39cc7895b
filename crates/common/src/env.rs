//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the parent directory of a file-backed store exists.
/// An empty path means the store lives only in memory.
pub async fn ensure_store_dir(store_path: &str) -> anyhow::Result<()> {
    if store_path.trim().is_empty() {
        warn!("store.path is empty; records are kept in memory and lost on exit");
        return Ok(());
    }
    let parent = match Path::new(store_path).parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Ok(()),
    };
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    info!(dir = %parent.display(), "store directory ready");
    Ok(())
}
