use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use tracing::{debug, warn};

use super::entities::StatsDocument;

/// Interface for abstracting persistence of the statistics document.
/// All four parts of the document travel together; there are no partial
/// writes.
pub trait StatsStore {
    /// Loads the persisted document. A missing or unreadable document is
    /// not an error: startup must never be prevented by a corrupted store,
    /// so both fall back to the default (empty) document.
    fn load(&self) -> impl Future<Output = Result<StatsDocument>> + Send;

    fn save(&self, document: &StatsDocument) -> impl Future<Output = Result<()>> + Send;
}

/// The main realization of [StatsStore]: one JSON file, replaced atomically
/// on every save so concurrent readers (the CLI) never observe a torn
/// document.
pub struct JsonStatsStore {
    path: PathBuf,
}

impl JsonStatsStore {
    pub fn new(path: PathBuf) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatsStore for JsonStatsStore {
    async fn load(&self) -> Result<StatsDocument> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stats document at {:?}, starting fresh", self.path);
                return Ok(StatsDocument::default());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(document) => Ok(document),
            Err(e) => {
                // Might happen after shutdowns cutting off a write on
                // filesystems without atomic rename. Defaults beat a crash.
                warn!("Stats document at {:?} is corrupted, falling back to defaults: {e}", self.path);
                Ok(StatsDocument::default())
            }
        }
    }

    async fn save(&self, document: &StatsDocument) -> Result<()> {
        let staging = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(document)?;
        tokio::fs::write(&staging, &bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}
