//! The editor host: where themes, the manifest and settings live.
//!
//! ## Learning: async fn in traits
//!
//! Trait methods return `impl Future<Output = _> + Send`. Implementations
//! can still be written as plain `async fn`, and the `Send` bound lets the
//! session call them from spawned tasks such as the preview debouncer.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tinct_theme::{CompiledTheme, ThemeDocument, ThemeKind};
use tracing::{debug, info};

use crate::io::{read_json, write_json_atomic};
use crate::tracker::RequestTracker;
use crate::{CoreError, CoreResult};

/// One `contributes.themes` entry of an extension manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeEntry {
    pub label: String,
    pub ui_theme: String,
    pub path: String,
}

impl ThemeEntry {
    /// The manifest entry for a compiled theme in `themes/`.
    pub fn for_theme(label: &str, kind: ThemeKind, file_name: &str) -> Self {
        let ui_theme = match kind {
            ThemeKind::Light => "vs",
            ThemeKind::Dark => "vs-dark",
        };
        Self {
            label: label.to_string(),
            ui_theme: ui_theme.to_string(),
            path: format!("./themes/{file_name}"),
        }
    }
}

/// Operations the session needs from the editor.
pub trait ThemeHost: Send + Sync + 'static {
    /// Reads the theme the user is customizing.
    fn read_active_theme(&self) -> impl Future<Output = CoreResult<ThemeDocument>> + Send;

    /// Writes a compiled theme file.
    fn write_theme(&self, theme: &CompiledTheme) -> impl Future<Output = CoreResult<()>> + Send;

    fn list_theme_entries(&self) -> impl Future<Output = CoreResult<Vec<ThemeEntry>>> + Send;

    /// Adds a manifest entry. Returns false if an entry with the same path exists.
    fn add_theme_entry(&self, entry: ThemeEntry) -> impl Future<Output = CoreResult<bool>> + Send;

    fn read_settings(&self) -> impl Future<Output = CoreResult<Map<String, Value>>> + Send;

    fn write_settings(&self, settings: Map<String, Value>) -> impl Future<Output = CoreResult<()>> + Send;

    /// Asks the editor to reload its window.
    fn request_reload(&self) -> impl Future<Output = CoreResult<()>> + Send;
}

/// A host backed by an extension directory on disk.
///
/// ```text
/// <dir>/package.json     contributes.themes
/// <dir>/themes/*.json    theme files
/// <dir>/settings.json    editor settings (unless configured elsewhere)
/// ```
#[derive(Debug)]
pub struct FsHost {
    extension_dir: PathBuf,
    active_theme: Option<PathBuf>,
    settings_path: PathBuf,
    reloads: AtomicUsize,
}

impl FsHost {
    pub fn new(extension_dir: impl Into<PathBuf>) -> Self {
        let extension_dir = extension_dir.into();
        let settings_path = extension_dir.join("settings.json");
        Self {
            extension_dir,
            active_theme: None,
            settings_path,
            reloads: AtomicUsize::new(0),
        }
    }

    /// Customizes this theme file instead of the first manifest entry.
    pub fn with_active_theme(mut self, path: impl Into<PathBuf>) -> Self {
        self.active_theme = Some(path.into());
        self
    }

    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = path.into();
        self
    }

    pub fn themes_dir(&self) -> PathBuf {
        self.extension_dir.join("themes")
    }

    fn manifest_path(&self) -> PathBuf {
        self.extension_dir.join("package.json")
    }

    /// How many reloads were requested.
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::Relaxed)
    }

    async fn read_manifest(&self) -> CoreResult<Map<String, Value>> {
        match read_json(&self.manifest_path()).await {
            Ok(manifest) => Ok(manifest),
            Err(CoreError::NotFound(_)) => Ok(Map::new()),
            Err(err) => Err(err),
        }
    }

    fn resolve_entry_path(&self, entry_path: &str) -> PathBuf {
        let relative = entry_path.strip_prefix("./").unwrap_or(entry_path);
        self.extension_dir.join(Path::new(relative))
    }
}

fn manifest_themes(manifest: &Map<String, Value>) -> CoreResult<Vec<ThemeEntry>> {
    match manifest.get("contributes").and_then(|c| c.get("themes")) {
        Some(themes) => serde_json::from_value(themes.clone())
            .map_err(|err| CoreError::Validation(format!("bad contributes.themes: {err}"))),
        None => Ok(Vec::new()),
    }
}

impl ThemeHost for FsHost {
    async fn read_active_theme(&self) -> CoreResult<ThemeDocument> {
        let path = match &self.active_theme {
            Some(path) => path.clone(),
            None => {
                let entries = manifest_themes(&self.read_manifest().await?)?;
                let first = entries
                    .first()
                    .ok_or_else(|| CoreError::NotFound("no theme in package.json".into()))?;
                self.resolve_entry_path(&first.path)
            }
        };
        debug!("Reading active theme {}", path.display());
        read_json(&path).await
    }

    async fn write_theme(&self, theme: &CompiledTheme) -> CoreResult<()> {
        let path = self.themes_dir().join(&theme.file_name);
        write_json_atomic(&path, &theme.document).await?;
        info!("Wrote theme {}", path.display());
        Ok(())
    }

    async fn list_theme_entries(&self) -> CoreResult<Vec<ThemeEntry>> {
        manifest_themes(&self.read_manifest().await?)
    }

    async fn add_theme_entry(&self, entry: ThemeEntry) -> CoreResult<bool> {
        let mut manifest = self.read_manifest().await?;
        let mut entries = manifest_themes(&manifest)?;
        if entries.iter().any(|e| e.path == entry.path) {
            return Ok(false);
        }
        entries.push(entry);

        let contributes = manifest
            .entry("contributes")
            .or_insert_with(|| json!({}));
        if !contributes.is_object() {
            *contributes = json!({});
        }
        if let Some(obj) = contributes.as_object_mut() {
            obj.insert("themes".into(), serde_json::to_value(&entries)?);
        }
        write_json_atomic(&self.manifest_path(), &manifest).await?;
        Ok(true)
    }

    async fn read_settings(&self) -> CoreResult<Map<String, Value>> {
        match read_json(&self.settings_path).await {
            Ok(settings) => Ok(settings),
            Err(CoreError::NotFound(_)) => Ok(Map::new()),
            Err(err) => Err(err),
        }
    }

    async fn write_settings(&self, settings: Map<String, Value>) -> CoreResult<()> {
        write_json_atomic(&self.settings_path, &settings).await
    }

    async fn request_reload(&self) -> CoreResult<()> {
        self.reloads.fetch_add(1, Ordering::Relaxed);
        info!("Reload requested");
        Ok(())
    }
}

/// A host on the other end of the bridge, reached through requests.
#[derive(Debug, Clone)]
pub struct RemoteHost {
    tracker: Arc<RequestTracker>,
}

impl RemoteHost {
    pub fn new(tracker: Arc<RequestTracker>) -> Self {
        Self { tracker }
    }
}

impl ThemeHost for RemoteHost {
    async fn read_active_theme(&self) -> CoreResult<ThemeDocument> {
        let payload = self.tracker.request("readActiveTheme", Value::Null).await?;
        Ok(serde_json::from_value(payload)?)
    }

    async fn write_theme(&self, theme: &CompiledTheme) -> CoreResult<()> {
        let payload = json!({
            "fileName": theme.file_name,
            "theme": serde_json::to_value(&theme.document)?,
        });
        self.tracker.request("writeTheme", payload).await?;
        Ok(())
    }

    async fn list_theme_entries(&self) -> CoreResult<Vec<ThemeEntry>> {
        let payload = self.tracker.request("listThemeEntries", Value::Null).await?;
        Ok(serde_json::from_value(payload)?)
    }

    async fn add_theme_entry(&self, entry: ThemeEntry) -> CoreResult<bool> {
        let payload = self
            .tracker
            .request("addThemeEntry", serde_json::to_value(&entry)?)
            .await?;
        Ok(payload.as_bool().unwrap_or(true))
    }

    async fn read_settings(&self) -> CoreResult<Map<String, Value>> {
        let payload = self.tracker.request("readSettings", Value::Null).await?;
        match payload {
            Value::Object(settings) => Ok(settings),
            Value::Null => Ok(Map::new()),
            other => Err(CoreError::Validation(format!("settings must be an object, got {other}"))),
        }
    }

    async fn write_settings(&self, settings: Map<String, Value>) -> CoreResult<()> {
        self.tracker.request("writeSettings", Value::Object(settings)).await?;
        Ok(())
    }

    async fn request_reload(&self) -> CoreResult<()> {
        self.tracker.request("requestReload", Value::Null).await?;
        Ok(())
    }
}
