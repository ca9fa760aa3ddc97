//! One customization session.
//!
//! ## Data Flow
//!
//! ```text
//! UI edit ──▶ DraftQueue ──▶ draft.json
//!                 │
//!                 └──▶ (debounced) committed + draft ──▶ build_theme ──▶ host
//!
//! save ──▶ committed + draft ──▶ host theme/manifest/settings ──▶ VersionStore
//! ```
//!
//! The session is owned by a single task and handles one request at a time.
//! Only preview writes run in the background, and the debouncer cancels them
//! whenever the committed theme is about to be written instead.

use serde_json::{json, Map, Value};
use std::sync::Arc;
use tinct_draft::{ChangeKind, DraftChange, DraftState, StructuredState};
use tinct_theme::{CompiledTheme, ResolvedTokenMap, ThemeCompiler, ThemeDocument};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::PreviewConfig;
use crate::customize::{build_theme, effective_tokens};
use crate::draft_queue::DraftQueue;
use crate::event::{EventBus, Notification, SessionEvent};
use crate::host::{ThemeEntry, ThemeHost};
use crate::io::{read_json, remove_if_exists, write_json_atomic};
use crate::preview::Debouncer;
use crate::protocol::{Command, Request, Response};
use crate::versions::{VersionListing, VersionMeta, VersionStore};
use crate::{CoreError, CoreResult};

/// A customization session over one base theme.
pub struct Session<H: ThemeHost> {
    host: Arc<H>,
    store: Arc<VersionStore>,
    compiler: ThemeCompiler,
    base_theme: Arc<ThemeDocument>,
    committed: StructuredState,
    drafts: DraftQueue,
    events: EventBus,
    preview: Debouncer,
    live_preview: bool,
}

impl<H: ThemeHost> Session<H> {
    /// Opens a session: reads the active theme, makes sure the version store
    /// exists, and brings back any unsaved draft.
    pub async fn open(
        host: H,
        store: Arc<VersionStore>,
        compiler: ThemeCompiler,
        preview: &PreviewConfig,
    ) -> CoreResult<Self> {
        let base_theme = host.read_active_theme().await?;
        if store.init_base(&StructuredState::default()).await? {
            info!("Started version history for {}", base_theme.name);
        }
        let committed = store.current().await?;

        let draft = match read_json::<StructuredState>(&store.paths().draft()).await {
            Ok(saved) => {
                let draft = DraftState::from_structured_state(&saved);
                info!("Restored {} unsaved change(s)", draft.len());
                draft
            }
            Err(CoreError::NotFound(_)) => DraftState::new(),
            Err(err) => {
                warn!("Ignoring unreadable draft file: {err}");
                DraftState::new()
            }
        };

        Ok(Self {
            host: Arc::new(host),
            store,
            compiler,
            base_theme: Arc::new(base_theme),
            committed,
            drafts: DraftQueue::spawn(draft),
            events: EventBus::new(),
            preview: Debouncer::new(preview.debounce()),
            live_preview: preview.enabled,
        })
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// The state of the current version.
    pub fn committed(&self) -> &StructuredState {
        &self.committed
    }

    pub fn live_preview(&self) -> bool {
        self.live_preview
    }

    /// True while a preview write is waiting for its quiet period.
    pub fn preview_pending(&self) -> bool {
        self.preview.is_pending()
    }

    pub async fn draft(&self) -> CoreResult<DraftState> {
        self.drafts.snapshot().await
    }

    /// Tokens as they look with the committed state and the draft applied.
    pub async fn resolved_tokens(&self) -> CoreResult<ResolvedTokenMap> {
        let draft = self.drafts.snapshot().await?;
        Ok(effective_tokens(&self.base_theme, &self.with_draft(&draft)))
    }

    /// Applies edits to the draft. Returns how many changed it.
    pub async fn apply_changes(&mut self, changes: Vec<DraftChange>) -> CoreResult<usize> {
        let (altered, draft) = self.drafts.apply(changes).await?;
        if altered > 0 {
            self.draft_updated(&draft).await?;
        }
        Ok(altered)
    }

    /// Drops one edit from the draft. Missing edits are not an error.
    pub async fn remove_change(&mut self, kind: ChangeKind, key: &str) -> CoreResult<bool> {
        let (removed, draft) = self.drafts.remove(kind, key).await?;
        if removed {
            self.draft_updated(&draft).await?;
        }
        Ok(removed)
    }

    /// Throws the draft away and rolls any live preview back.
    pub async fn discard_draft(&mut self) -> CoreResult<()> {
        self.preview.cancel();
        let draft = self.drafts.discard().await?;
        remove_if_exists(&self.store.paths().draft()).await?;
        if self.live_preview {
            self.write_committed_theme().await?;
        }
        self.events.emit(SessionEvent::DraftChanged { pending: draft.len() });
        Ok(())
    }

    /// Commits the draft as a new version and writes the output theme.
    ///
    /// The host is written first and the version is committed last. If any
    /// step fails, the host is put back on the committed state and the draft
    /// stays pending.
    pub async fn save(&mut self) -> CoreResult<VersionMeta> {
        let draft = self.drafts.snapshot().await?;
        if draft.is_empty() {
            return Err(CoreError::Validation("nothing to save".into()));
        }
        self.preview.cancel();

        let next = self.with_draft(&draft);
        let attempt = async {
            let compiled = self.write_host_state(&next).await?;
            let entry = ThemeEntry::for_theme(self.compiler.name(), self.compiler.kind(), &compiled.file_name);
            if self.host.add_theme_entry(entry).await? {
                debug!("Registered {} in the manifest", compiled.file_name);
            }
            let meta = self.store.save_new_version(&next).await?;
            Ok::<_, CoreError>((compiled, meta))
        }
        .await;
        let (compiled, meta) = match attempt {
            Ok(done) => done,
            Err(err) => return Err(self.abandon_switch(&next, err).await),
        };

        self.committed = next;
        self.clear_draft().await;

        self.events.emit(SessionEvent::ThemeUpdated {
            file_name: compiled.file_name,
            preview: false,
        });
        self.events.emit(SessionEvent::VersionChanged(meta));
        self.events.emit(SessionEvent::DraftChanged { pending: 0 });
        self.events.emit(SessionEvent::Notification(Notification::info(format!(
            "Saved version {}",
            meta.latest_version
        ))));
        Ok(meta)
    }

    pub async fn list_versions(&self) -> CoreResult<VersionListing> {
        self.store.list_versions().await
    }

    /// Makes version `n` current. The draft is kept.
    pub async fn restore_version(&mut self, n: u32) -> CoreResult<VersionMeta> {
        let state = self.store.load_version(n).await?;
        self.preview.cancel();

        let attempt = async {
            let compiled = self.write_host_state(&state).await?;
            let (meta, _) = self.store.restore_version(n).await?;
            Ok::<_, CoreError>((compiled, meta))
        }
        .await;
        match attempt {
            Ok((compiled, meta)) => Ok(self.switched(state, compiled, meta).await),
            Err(err) => Err(self.abandon_switch(&state, err).await),
        }
    }

    pub async fn reset_to_base(&mut self) -> CoreResult<VersionMeta> {
        let state = self.store.base().await?;
        self.preview.cancel();

        let attempt = async {
            let compiled = self.write_host_state(&state).await?;
            let (meta, _) = self.store.reset_to_base().await?;
            Ok::<_, CoreError>((compiled, meta))
        }
        .await;
        match attempt {
            Ok((compiled, meta)) => Ok(self.switched(state, compiled, meta).await),
            Err(err) => Err(self.abandon_switch(&state, err).await),
        }
    }

    /// Turns live preview on or off. Turning it off rolls the preview back.
    pub async fn set_live_preview(&mut self, enabled: bool) -> CoreResult<()> {
        if self.live_preview == enabled {
            return Ok(());
        }
        self.live_preview = enabled;

        let draft = self.drafts.snapshot().await?;
        if enabled {
            self.schedule_preview(&draft);
        } else {
            self.preview.cancel();
            if !draft.is_empty() {
                self.write_committed_theme().await?;
            }
        }
        Ok(())
    }

    /// The full session state, as sent to the UI.
    pub async fn state(&self) -> CoreResult<Value> {
        let draft = self.drafts.snapshot().await?;
        let versions = self.store.meta().await?;
        Ok(json!({
            "themeName": self.compiler.name(),
            "baseTheme": self.base_theme.name,
            "draft": draft.changes(),
            "pending": draft.pending_against(&self.committed),
            "committed": self.committed.to_value(),
            "versions": versions,
            "livePreview": self.live_preview,
        }))
    }

    /// Runs one UI request. Failures become error responses and notifications.
    pub async fn handle(&mut self, request: &Request) -> Response {
        match self.dispatch(request).await {
            Ok(payload) => Response::success(request, payload),
            Err(err) => {
                warn!("{} failed: {err}", request.command);
                self.events
                    .emit(SessionEvent::Notification(Notification::from_error(&err)));
                Response::error(request, &err)
            }
        }
    }

    async fn dispatch(&mut self, request: &Request) -> CoreResult<Value> {
        let payload = match Command::from_request(request)? {
            Command::GetState => self.state().await?,
            Command::GetResolvedTokens => serde_json::to_value(self.resolved_tokens().await?)?,
            Command::ApplyChanges(changes) => {
                let applied = self.apply_changes(changes).await?;
                json!({ "applied": applied, "pending": self.drafts.snapshot().await?.len() })
            }
            Command::RemoveChange { kind, key } => {
                let removed = self.remove_change(kind, &key).await?;
                json!({ "removed": removed, "pending": self.drafts.snapshot().await?.len() })
            }
            Command::DiscardDraft => {
                self.discard_draft().await?;
                json!({ "pending": 0 })
            }
            Command::Save => serde_json::to_value(self.save().await?)?,
            Command::ListVersions => serde_json::to_value(self.list_versions().await?)?,
            Command::RestoreVersion(n) => serde_json::to_value(self.restore_version(n).await?)?,
            Command::ResetToBase => serde_json::to_value(self.reset_to_base().await?)?,
            Command::SetLivePreview(enabled) => {
                self.set_live_preview(enabled).await?;
                json!({ "enabled": self.live_preview })
            }
        };
        Ok(payload)
    }

    fn with_draft(&self, draft: &DraftState) -> StructuredState {
        let mut state = self.committed.clone();
        state.merge(&draft.to_structured_state());
        state
    }

    async fn draft_updated(&mut self, draft: &DraftState) -> CoreResult<()> {
        let path = self.store.paths().draft();
        if draft.is_empty() {
            remove_if_exists(&path).await?;
        } else {
            write_json_atomic(&path, &draft.to_structured_state()).await?;
        }
        self.events.emit(SessionEvent::DraftChanged { pending: draft.len() });
        self.schedule_preview(draft);
        Ok(())
    }

    fn schedule_preview(&mut self, draft: &DraftState) {
        if !self.live_preview {
            return;
        }
        let compiled = build_theme(&self.compiler, &self.base_theme, &self.with_draft(draft));
        let host = self.host.clone();
        let events = self.events.clone();
        self.preview.schedule(async move {
            match host.write_theme(&compiled).await {
                Ok(()) => events.emit(SessionEvent::ThemeUpdated {
                    file_name: compiled.file_name,
                    preview: true,
                }),
                Err(err) => {
                    warn!("Preview write failed: {err}");
                    events.emit(SessionEvent::Notification(Notification::from_error(&err)));
                }
            }
        });
    }

    async fn write_theme(&self, compiled: &CompiledTheme, preview: bool) -> CoreResult<()> {
        self.host.write_theme(compiled).await?;
        self.events.emit(SessionEvent::ThemeUpdated {
            file_name: compiled.file_name.clone(),
            preview,
        });
        Ok(())
    }

    async fn write_committed_theme(&self) -> CoreResult<()> {
        let compiled = build_theme(&self.compiler, &self.base_theme, &self.committed);
        self.write_theme(&compiled, false).await
    }

    /// Writes the output theme and settings for `target` over the committed
    /// state. Nothing in the session changes.
    async fn write_host_state(&self, target: &StructuredState) -> CoreResult<CompiledTheme> {
        let compiled = build_theme(&self.compiler, &self.base_theme, target);
        self.host.write_theme(&compiled).await?;

        let settings = settings_delta(&self.committed, target);
        if !settings.is_empty() {
            self.apply_settings(&settings).await?;
        }
        Ok(compiled)
    }

    /// Puts the host back on the committed state after a failed switch to
    /// `attempted` and hands back the error that stopped it.
    ///
    /// Rollback failures are logged; the caller sees the original error.
    async fn abandon_switch(&mut self, attempted: &StructuredState, err: CoreError) -> CoreError {
        warn!("Keeping the committed state: {err}");

        let compiled = build_theme(&self.compiler, &self.base_theme, &self.committed);
        if let Err(rollback) = self.host.write_theme(&compiled).await {
            warn!("Could not roll the output theme back: {rollback}");
        }
        let settings = settings_delta(attempted, &self.committed);
        if !settings.is_empty() {
            if let Err(rollback) = self.apply_settings(&settings).await {
                warn!("Could not roll settings back: {rollback}");
            }
        }

        self.resume_preview().await;
        err
    }

    /// Finishes a restore or reset that reached the store.
    async fn switched(
        &mut self,
        state: StructuredState,
        compiled: CompiledTheme,
        meta: VersionMeta,
    ) -> VersionMeta {
        self.committed = state;
        self.events.emit(SessionEvent::ThemeUpdated {
            file_name: compiled.file_name,
            preview: false,
        });
        self.events.emit(SessionEvent::VersionChanged(meta));
        self.resume_preview().await;
        meta
    }

    /// Shows the pending draft again after the committed theme was written.
    async fn resume_preview(&mut self) {
        match self.drafts.snapshot().await {
            Ok(draft) if !draft.is_empty() => self.schedule_preview(&draft),
            Ok(_) => {}
            Err(err) => warn!("Could not read the draft: {err}"),
        }
    }

    /// Empties the draft once its changes are committed.
    ///
    /// The version is already on disk at this point, so failures are
    /// reported as a warning rather than failing the save.
    async fn clear_draft(&mut self) {
        let cleared = async {
            self.drafts.discard().await?;
            remove_if_exists(&self.store.paths().draft()).await
        }
        .await;
        if let Err(err) = cleared {
            warn!("Saved, but the draft could not be cleared: {err}");
            self.events.emit(SessionEvent::Notification(Notification::warning(format!(
                "Saved, but the draft could not be cleared: {err}"
            ))));
        }
    }

    /// Writes setting changes to the host; `null` removes a setting.
    async fn apply_settings(&self, changes: &Map<String, Value>) -> CoreResult<()> {
        let mut settings = self.host.read_settings().await?;
        for (key, value) in changes {
            if value.is_null() {
                settings.remove(key);
            } else {
                settings.insert(key.clone(), value.clone());
            }
        }
        self.host.write_settings(settings).await?;

        if let Err(err) = self.host.request_reload().await {
            warn!("Settings written, but the reload request failed: {err}");
        }
        Ok(())
    }
}

/// Setting writes that move the host from `from` to `to`: changed values,
/// and `null` for keys only `from` sets.
fn settings_delta(from: &StructuredState, to: &StructuredState) -> Map<String, Value> {
    let mut delta: Map<String, Value> = to
        .settings_customization
        .iter()
        .filter(|(key, value)| from.settings_customization.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    for key in from.settings_customization.keys() {
        if !to.settings_customization.contains_key(key) {
            delta.insert(key.clone(), Value::Null);
        }
    }
    delta
}
