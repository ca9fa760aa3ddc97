//! Numbered snapshots of committed customizations.
//!
//! ## On-disk layout
//!
//! ```text
//! <root>/meta.json               {"latestVersion": N, "currentVersion": K}
//! <root>/draft.json              unsaved draft (optional)
//! <root>/store/base.json         version 0
//! <root>/store/current.json      copy of the active snapshot
//! <root>/store/versions/001.json
//! <root>/store/versions/002.json
//! ```
//!
//! ## Learning: Write Content Before Metadata
//!
//! Every operation writes its content files first and `meta.json` last.
//! If a content write fails the metadata still describes the previous,
//! fully written state, so `currentVersion` always names a file that exists.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tinct_draft::StructuredState;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::io::{read_json, write_json_atomic};
use crate::{CoreError, CoreResult};

/// Version pointers kept in `meta.json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMeta {
    pub latest_version: u32,
    pub current_version: u32,
}

/// Metadata plus the snapshot numbers present on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionListing {
    #[serde(flatten)]
    pub meta: VersionMeta,
    pub versions: Vec<u32>,
}

/// File locations under one store root.
#[derive(Debug, Clone)]
pub struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }

    pub fn draft(&self) -> PathBuf {
        self.root.join("draft.json")
    }

    pub fn base(&self) -> PathBuf {
        self.root.join("store").join("base.json")
    }

    pub fn current(&self) -> PathBuf {
        self.root.join("store").join("current.json")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("store").join("versions")
    }

    /// `store/versions/007.json`
    pub fn version(&self, n: u32) -> PathBuf {
        self.versions_dir().join(format!("{n:03}.json"))
    }
}

/// The version control store for one base directory.
///
/// Construct one per process and share it by reference. All operations take
/// an internal lock, so concurrent callers never interleave their writes and
/// a repeated `init_base` cannot clobber history.
#[derive(Debug)]
pub struct VersionStore {
    paths: StorePaths,
    lock: Mutex<()>,
}

impl VersionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: StorePaths::new(root),
            lock: Mutex::new(()),
        }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Records the base snapshot if there is none yet.
    ///
    /// Returns true if this call created the store. When a base exists but
    /// `meta.json` is missing, the metadata is rebuilt from the snapshots on
    /// disk instead of starting over.
    pub async fn init_base(&self, settings: &StructuredState) -> CoreResult<bool> {
        let _guard = self.lock.lock().await;

        if fs::try_exists(self.paths.base()).await? {
            if !fs::try_exists(self.paths.meta()).await? {
                let latest = self.scan_versions().await?.last().copied().unwrap_or(0);
                warn!("meta.json missing, recovered latest version {latest}");
                let meta = VersionMeta {
                    latest_version: latest,
                    current_version: latest,
                };
                let snapshot = if latest == 0 {
                    self.paths.base()
                } else {
                    self.paths.version(latest)
                };
                let current: StructuredState = read_json(&snapshot).await?;
                write_json_atomic(&self.paths.current(), &current).await?;
                write_json_atomic(&self.paths.meta(), &meta).await?;
            }
            debug!("Version store already initialized at {}", self.paths.root().display());
            return Ok(false);
        }

        write_json_atomic(&self.paths.base(), settings).await?;
        write_json_atomic(&self.paths.current(), settings).await?;
        write_json_atomic(&self.paths.meta(), &VersionMeta::default()).await?;
        info!("Initialized version store at {}", self.paths.root().display());
        Ok(true)
    }

    /// Commits `settings` as the next version and makes it current.
    pub async fn save_new_version(&self, settings: &StructuredState) -> CoreResult<VersionMeta> {
        let _guard = self.lock.lock().await;
        let meta = self.read_meta().await?;

        let next = meta.latest_version + 1;
        write_json_atomic(&self.paths.version(next), settings).await?;
        write_json_atomic(&self.paths.current(), settings).await?;

        let meta = VersionMeta {
            latest_version: next,
            current_version: next,
        };
        write_json_atomic(&self.paths.meta(), &meta).await?;
        info!("Saved version {next}");
        Ok(meta)
    }

    /// Makes snapshot `n` current. Version 0 is the base.
    ///
    /// Later versions are kept; `latestVersion` does not change.
    pub async fn restore_version(&self, n: u32) -> CoreResult<(VersionMeta, StructuredState)> {
        let _guard = self.lock.lock().await;
        let meta = self.read_meta().await?;

        if n > meta.latest_version {
            return Err(CoreError::NotFound(format!(
                "version {n} (latest is {})",
                meta.latest_version
            )));
        }
        let snapshot = self.read_snapshot(n).await?;
        write_json_atomic(&self.paths.current(), &snapshot).await?;

        let meta = VersionMeta {
            current_version: n,
            ..meta
        };
        write_json_atomic(&self.paths.meta(), &meta).await?;
        info!("Restored version {n}");
        Ok((meta, snapshot))
    }

    /// Makes the base current again.
    pub async fn reset_to_base(&self) -> CoreResult<(VersionMeta, StructuredState)> {
        self.restore_version(0).await
    }

    pub async fn meta(&self) -> CoreResult<VersionMeta> {
        let _guard = self.lock.lock().await;
        self.read_meta().await
    }

    pub async fn current(&self) -> CoreResult<StructuredState> {
        let _guard = self.lock.lock().await;
        read_json(&self.paths.current()).await
    }

    pub async fn base(&self) -> CoreResult<StructuredState> {
        let _guard = self.lock.lock().await;
        read_json(&self.paths.base()).await
    }

    /// Reads a snapshot without making it current.
    pub async fn load_version(&self, n: u32) -> CoreResult<StructuredState> {
        let _guard = self.lock.lock().await;
        self.read_snapshot(n).await
    }

    pub async fn list_versions(&self) -> CoreResult<VersionListing> {
        let _guard = self.lock.lock().await;
        Ok(VersionListing {
            meta: self.read_meta().await?,
            versions: self.scan_versions().await?,
        })
    }

    async fn read_meta(&self) -> CoreResult<VersionMeta> {
        read_json(&self.paths.meta()).await.map_err(|err| match err {
            CoreError::NotFound(_) => CoreError::NotFound("version store is not initialized".into()),
            other => other,
        })
    }

    async fn read_snapshot(&self, n: u32) -> CoreResult<StructuredState> {
        let path = if n == 0 {
            self.paths.base()
        } else {
            self.paths.version(n)
        };
        read_json(&path).await.map_err(|err| match err {
            CoreError::NotFound(_) => CoreError::NotFound(format!("version {n}")),
            other => other,
        })
    }

    /// Snapshot numbers found in `store/versions`, ascending.
    async fn scan_versions(&self) -> CoreResult<Vec<u32>> {
        let mut versions = Vec::new();
        let mut entries = match fs::read_dir(self.paths.versions_dir()).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(versions),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if let Ok(n) = stem.parse::<u32>() {
                versions.push(n);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }
}
