//! The Reconciliation Engine: the top-level coordinator. Owns all mutable
//! state, is the sole writer of the State Store and the tracked directory.

mod events;
mod poller;
mod watcher;
mod webhook;

pub use events::Event;
pub use webhook::WebhookScopeFilter;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{RemoteError, SyncError};
use crate::fingerprint::{fingerprint, normalize};
use crate::format_codec::FormatCodec;
use crate::frontmatter::{frontmatter_id, render_frontmatter, strip_frontmatter, Frontmatter};
use crate::merge::{merge, MergeResult};
use crate::remote::{NewPage, PageUpdate, RemoteStore};
use crate::state::StateStore;
use crate::types::{
	Accept, DirectoryConfig, DirectorySettings, OnConflict, PageId, PageState, Scope, SyncState,
};
use crate::utils::lock::FileLock;

const CONFLICT_MARKER_START: &str = "<<<<<<< LOCAL";
const CONFLICT_MARKER_SEP: &str = "=======";
const CONFLICT_MARKER_END: &str = ">>>>>>> REMOTE";

fn has_conflict_markers(text: &str) -> bool {
	text.lines().any(|l| l.starts_with(CONFLICT_MARKER_START))
}

/// Per-syncState counts, as reported by `status`.
#[derive(Debug, Default, Clone)]
pub struct StatusReport {
	pub synced: usize,
	pub local_modified: usize,
	pub remote_modified: usize,
	pub conflict: usize,
}

/// One action the engine performed (or, under dry-run, would have
/// performed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
	WroteFile { path: String },
	Uploaded { id: PageId },
	Pulled { id: PageId },
	MarkedConflict { id: PageId },
}

/// What a conflict resolution decided to do with the conflicting text,
/// distinct from the raw three-way `MergeResult`: `on-conflict = local`/
/// `remote` never run the merge algorithm, and `remote` in particular must
/// never re-upload — it is a pull, not a push.
enum ConflictResolution {
	Merged(MergeResult),
	AcceptLocal(String),
	AcceptRemote { text: String, version: u64 },
}

pub struct ReconciliationEngine {
	root: PathBuf,
	store: StateStore,
	remote: Arc<dyn RemoteStore>,
	codec: Arc<dyn FormatCodec>,
	config: Config,
}

impl ReconciliationEngine {
	pub fn new(
		root: impl Into<PathBuf>,
		remote: Arc<dyn RemoteStore>,
		codec: Arc<dyn FormatCodec>,
		config: Config,
	) -> Self {
		let root = root.into();
		ReconciliationEngine { store: StateStore::new(&root), root, remote, codec, config }
	}

	fn file_path(&self, relative: &str) -> PathBuf {
		self.root.join(relative)
	}

	async fn read_local(&self, relative: &str) -> std::io::Result<String> {
		tokio::fs::read_to_string(self.file_path(relative)).await
	}

	async fn write_local(&self, relative: &str, contents: &str) -> Result<(), SyncError> {
		if self.config.dry_run {
			return Ok(());
		}
		let path = self.file_path(relative);
		if let Some(parent) = path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}
		tokio::fs::write(path, contents).await?;
		Ok(())
	}

	/// `init(root, space)`: create `.atlcli/`, write initial `DirectoryState`.
	pub async fn init(&self, space_key: &str, base_url: &str, profile: &str) -> Result<(), SyncError> {
		let config = DirectoryConfig {
			schema_version: crate::types::SCHEMA_VERSION,
			space_key: space_key.to_string(),
			base_url: base_url.to_string(),
			profile: profile.to_string(),
			settings: DirectorySettings::default(),
		};
		self.store.init(&config).await?;
		Ok(())
	}

	/// `pull(root, selector, force)`: one-shot fetch of remote pages matching
	/// `selector`, writing or updating local files. Aborts per-file if it has
	/// diverged from `baseHash` and `force == false`.
	pub async fn pull(&self, selector: Scope, force: bool) -> Result<Vec<Action>, SyncError> {
		let mut state = self.store.read_state().await?;
		let mut actions = Vec::new();

		let entries = self.remote.enumerate_scope(&selector).await?;
		for entry in entries {
			let page = self.remote.get_page(&entry.id).await?;

			if let Some(existing) = state.pages.get(&entry.id) {
				if !force {
					let on_disk = self.read_local(&existing.path).await.unwrap_or_default();
					let local_hash = fingerprint(&on_disk);
					if local_hash != existing.local_hash {
						warn!("pull: {} diverged locally, skipping (use force to overwrite)", entry.id);
						continue;
					}
				}
			}

			let path = state
				.pages
				.get(&entry.id)
				.map(|p| p.path.clone())
				.unwrap_or_else(|| default_path_for(&page.title, &entry.id));

			let md_body = self.codec.storage_to_markdown(&page.storage_text);
			let normalized = normalize(&md_body);
			let fm = Frontmatter { id: Some(page.id.clone()), title: Some(page.title.clone()) };
			let rendered = render_frontmatter(&fm, &normalized);
			self.write_local(&path, &rendered).await?;
			actions.push(Action::WroteFile { path: path.clone() });

			if !self.config.dry_run {
				self.store.write_ancestor(&page.id, &normalized).await?;
				let hash = fingerprint(&normalized);
				state.upsert_page(PageState {
					id: page.id.clone(),
					path,
					title: page.title.clone(),
					space_key: page.space_key.clone(),
					version: page.version,
					last_synced_at: now_iso8601(),
					local_hash: hash.clone(),
					remote_hash: hash.clone(),
					base_hash: hash,
					sync_state: SyncState::Synced,
					parent_id: page.parent_id.clone(),
					tombstoned: false,
				})?;
			}
			actions.push(Action::Pulled { id: page.id });
		}

		if !self.config.dry_run {
			state.last_sync = now_iso8601();
			self.store.write_state(&state).await?;
		}
		Ok(actions)
	}

	/// `push(root)`: one-shot upload of every tracked local file whose
	/// normalized fingerprint differs from its recorded `baseHash`.
	pub async fn push(&self) -> Result<Vec<Action>, SyncError> {
		let mut state = self.store.read_state().await?;
		let mut actions = Vec::new();

		let ids: Vec<PageId> = state.pages.keys().cloned().collect();
		for id in ids {
			let page = state.pages.get(&id).unwrap().clone();
			let content = self.read_local(&page.path).await?;
			let local_hash = fingerprint(&content);
			if local_hash == page.base_hash {
				continue;
			}

			let remote_page = self.remote.get_page(&id).await?;
			if remote_page.version > page.version {
				// Remote has advanced: route through the merge engine instead
				// of blindly overwriting.
				let ancestor = self.store.read_ancestor(&id).await?;
				let local_body = strip_frontmatter(&content).1.to_string();
				let remote_body = self.codec.storage_to_markdown(&remote_page.storage_text);
				let result = merge(ancestor.as_deref(), &local_body, &remote_body);
				self.apply_conflict_resolution(&mut state, &id, ConflictResolution::Merged(result), &mut actions)
					.await?;
				continue;
			}

			if self.config.dry_run {
				actions.push(Action::Uploaded { id });
				continue;
			}

			let body = strip_frontmatter(&content).1;
			let storage = self.codec.markdown_to_storage(body);
			let updated = self
				.remote
				.update_page(PageUpdate {
					id: id.clone(),
					title: page.title.clone(),
					storage_text: storage,
					version: page.version,
				})
				.await?;

			let normalized = normalize(body);
			self.store.write_ancestor(&id, &normalized).await?;
			let hash = fingerprint(&normalized);
			if let Some(p) = state.pages.get_mut(&id) {
				p.version = updated.version;
				p.local_hash = hash.clone();
				p.remote_hash = hash.clone();
				p.base_hash = hash;
				p.sync_state = SyncState::Synced;
				p.last_synced_at = now_iso8601();
			}
			actions.push(Action::Uploaded { id });
		}

		if !self.config.dry_run {
			state.last_sync = now_iso8601();
			self.store.write_state(&state).await?;
		}
		Ok(actions)
	}

	/// `add(file, title?, parent_id?)`: register a previously untracked file
	/// as a new remote page.
	pub async fn add(
		&self,
		file: &Path,
		title: Option<String>,
		parent_id: Option<PageId>,
	) -> Result<PageId, SyncError> {
		if self.config.dry_run {
			return Err(SyncError::Usage {
				message: "add does not support dry-run: a new page id can only come from the remote"
					.to_string(),
			});
		}

		let relative = file
			.strip_prefix(&self.root)
			.map(|p| p.to_path_buf())
			.unwrap_or_else(|_| file.to_path_buf());
		let relative_str = relative.to_string_lossy().to_string();

		let content = self.read_local(&relative_str).await?;
		let (_, body) = strip_frontmatter(&content);
		let title = title.unwrap_or_else(|| derive_title(body, &relative_str));

		let mut state = self.store.read_state().await?;
		let config = self.store.read_config().await?;

		let storage = self.codec.markdown_to_storage(body);
		let created = self
			.remote
			.create_page(NewPage {
				space_key: config.space_key.clone(),
				title: title.clone(),
				storage_text: storage,
				parent_id: parent_id.clone(),
			})
			.await?;

		let normalized = normalize(body);
		let fm = Frontmatter { id: Some(created.id.clone()), title: Some(title.clone()) };
		let rendered = render_frontmatter(&fm, &normalized);
		self.write_local(&relative_str, &rendered).await?;

		if !self.config.dry_run {
			self.store.write_ancestor(&created.id, &normalized).await?;
			let hash = fingerprint(&normalized);
			state.upsert_page(PageState {
				id: created.id.clone(),
				path: relative_str,
				title,
				space_key: created.space_key.clone(),
				version: created.version,
				last_synced_at: now_iso8601(),
				local_hash: hash.clone(),
				remote_hash: hash.clone(),
				base_hash: hash,
				sync_state: SyncState::Synced,
				parent_id,
				tombstoned: false,
			})?;
			state.last_sync = now_iso8601();
			self.store.write_state(&state).await?;
		}

		Ok(created.id)
	}

	/// `status(root)`: report per-file `syncState` without mutating
	/// anything. A local divergence upgrades `synced` to `local-modified` in
	/// the report even if the persisted state file still reads `synced`.
	pub async fn status(&self) -> Result<StatusReport, SyncError> {
		let state = self.store.read_state().await?;
		let mut report = StatusReport::default();

		for page in state.pages.values() {
			let on_disk = self.read_local(&page.path).await.unwrap_or_default();
			if has_conflict_markers(&on_disk) {
				report.conflict += 1;
				continue;
			}
			let local_changed = fingerprint(&on_disk) != page.local_hash;
			let effective = if local_changed && page.sync_state == SyncState::Synced {
				SyncState::LocalModified
			} else {
				page.sync_state
			};
			match effective {
				SyncState::Synced => report.synced += 1,
				SyncState::LocalModified => report.local_modified += 1,
				SyncState::RemoteModified => report.remote_modified += 1,
				SyncState::Conflict => report.conflict += 1,
			}
		}
		Ok(report)
	}

	/// `resolve(file, accept)`: drop the non-accepted region from every
	/// conflict region. `accept == merged` requires the caller to have
	/// manually removed every marker first.
	pub async fn resolve(&self, file: &Path, accept: Accept) -> Result<(), SyncError> {
		let relative = file
			.strip_prefix(&self.root)
			.map(|p| p.to_string_lossy().to_string())
			.unwrap_or_else(|_| file.to_string_lossy().to_string());

		let content = self.read_local(&relative).await?;

		let resolved = match accept {
			Accept::Merged => {
				if has_conflict_markers(&content) {
					return Err(SyncError::Usage {
						message: "conflict markers still present; remove them before --accept merged"
							.to_string(),
					});
				}
				content.clone()
			}
			Accept::Local => strip_conflict_regions(&content, true),
			Accept::Remote => strip_conflict_regions(&content, false),
		};

		self.write_local(&relative, &resolved).await?;

		let mut state = self.store.read_state().await?;
		let id = frontmatter_id(&resolved)
			.or_else(|| state.path_index.get(&relative).cloned())
			.ok_or_else(|| SyncError::Usage { message: format!("{} is not tracked", relative) })?;

		if let Some(page) = state.pages.get_mut(&id) {
			page.sync_state = SyncState::LocalModified;
			page.local_hash = fingerprint(&resolved);
		}
		if !self.config.dry_run {
			self.store.write_state(&state).await?;
		}
		Ok(())
	}

	async fn apply_conflict_resolution(
		&self,
		state: &mut crate::types::DirectoryState,
		id: &PageId,
		resolution: ConflictResolution,
		actions: &mut Vec<Action>,
	) -> Result<(), SyncError> {
		let page = state.pages.get(id).cloned().ok_or_else(|| SyncError::Integrity {
			message: format!("page {} vanished mid-reconciliation", id),
		})?;

		match resolution {
			ConflictResolution::Merged(MergeResult::Clean(text)) | ConflictResolution::AcceptLocal(text) => {
				self.upload_resolved_text(state, id, &page, text, actions).await
			}
			ConflictResolution::Merged(MergeResult::Conflicted(text, _n)) => {
				let rendered = render_frontmatter(
					&Frontmatter { id: Some(id.clone()), title: Some(page.title.clone()) },
					&text,
				);
				self.write_local(&page.path, &rendered).await?;
				if !self.config.dry_run {
					if let Some(p) = state.pages.get_mut(id) {
						p.sync_state = SyncState::Conflict;
					}
				}
				actions.push(Action::MarkedConflict { id: id.clone() });
				Ok(())
			}
			ConflictResolution::AcceptRemote { text, version } => {
				// `on-conflict = remote` discards local changes; this is a
				// pull, not a push, so the remote is never written back to.
				let rendered = render_frontmatter(
					&Frontmatter { id: Some(id.clone()), title: Some(page.title.clone()) },
					&text,
				);
				self.write_local(&page.path, &rendered).await?;

				if !self.config.dry_run {
					self.store.write_ancestor(id, &text).await?;
					let hash = fingerprint(&text);
					if let Some(p) = state.pages.get_mut(id) {
						p.version = version;
						p.local_hash = hash.clone();
						p.remote_hash = hash.clone();
						p.base_hash = hash;
						p.sync_state = SyncState::Synced;
						p.last_synced_at = now_iso8601();
					}
				}
				actions.push(Action::Pulled { id: id.clone() });
				Ok(())
			}
		}
	}

	/// Upload a clean-resolved text to the remote and bring local bookkeeping
	/// in sync. Shared by a real merge's `Clean` outcome and `on-conflict =
	/// local`, which are both "keep this text, push it" cases.
	async fn upload_resolved_text(
		&self,
		state: &mut crate::types::DirectoryState,
		id: &PageId,
		page: &PageState,
		text: String,
		actions: &mut Vec<Action>,
	) -> Result<(), SyncError> {
		let rendered = render_frontmatter(
			&Frontmatter { id: Some(id.clone()), title: Some(page.title.clone()) },
			&text,
		);
		self.write_local(&page.path, &rendered).await?;

		if self.config.dry_run {
			actions.push(Action::Uploaded { id: id.clone() });
			return Ok(());
		}

		let storage = self.codec.markdown_to_storage(&text);
		let updated = self
			.remote
			.update_page(PageUpdate {
				id: id.clone(),
				title: page.title.clone(),
				storage_text: storage,
				version: page.version,
			})
			.await?;

		self.store.write_ancestor(id, &text).await?;
		let hash = fingerprint(&text);
		if let Some(p) = state.pages.get_mut(id) {
			p.version = updated.version;
			p.local_hash = hash.clone();
			p.remote_hash = hash.clone();
			p.base_hash = hash;
			p.sync_state = SyncState::Synced;
			p.last_synced_at = now_iso8601();
		}
		actions.push(Action::Uploaded { id: id.clone() });
		Ok(())
	}

	/// Handle one local-change event for tracked-directory-relative `path`.
	async fn handle_local_event(
		&self,
		state: &mut crate::types::DirectoryState,
		path: &Path,
	) -> Result<Vec<Action>, SyncError> {
		let relative = path.to_string_lossy().to_string();
		let mut actions = Vec::new();

		let id = match state.path_index.get(&relative).cloned() {
			Some(id) => id,
			None => {
				// Not indexed under this path. Frontmatter identity is
				// authoritative: if the file already carries an id for a page
				// we track under a different path, this is a rename, not a
				// new file.
				let content = self.read_local(&relative).await?;
				match frontmatter_id(&content).filter(|id| state.pages.contains_key(id)) {
					Some(id) => {
						if let Some(page) = state.pages.get_mut(&id) {
							let old_path = std::mem::replace(&mut page.path, relative.clone());
							state.path_index.remove(&old_path);
						}
						state.path_index.insert(relative.clone(), id.clone());
						id
					}
					None => {
						let config = self.store.read_config().await?;
						if config.settings.auto_create_pages {
							let id = self.add(&self.file_path(&relative), None, None).await?;
							actions.push(Action::Uploaded { id });
						}
						return Ok(actions);
					}
				}
			}
		};

		let content = self.read_local(&relative).await?;
		if has_conflict_markers(&content) {
			if let Some(page) = state.pages.get_mut(&id) {
				page.sync_state = SyncState::Conflict;
			}
			actions.push(Action::MarkedConflict { id });
			return Ok(actions);
		}

		let body = strip_frontmatter(&content).1;
		let local_hash = fingerprint(body);

		let remote_page = self.remote.get_page(&id).await?;
		let page = state.pages.get(&id).unwrap().clone();
		let remote_body = self.codec.storage_to_markdown(&remote_page.storage_text);
		let remote_hash = fingerprint(&remote_body);

		let local_changed = local_hash != page.local_hash;
		let remote_changed =
			remote_page.version > page.version || remote_hash != page.remote_hash;
		let sync_state = SyncState::from_changed(local_changed, remote_changed);

		match sync_state {
			SyncState::LocalModified => {
				if self.config.dry_run {
					actions.push(Action::Uploaded { id });
					return Ok(actions);
				}

				let storage = self.codec.markdown_to_storage(body);
				let updated = self
					.remote
					.update_page(PageUpdate {
						id: id.clone(),
						title: page.title.clone(),
						storage_text: storage,
						version: page.version,
					})
					.await?;
				let normalized = normalize(body);
				self.store.write_ancestor(&id, &normalized).await?;
				let hash = fingerprint(&normalized);
				if let Some(p) = state.pages.get_mut(&id) {
					p.version = updated.version;
					p.local_hash = hash.clone();
					p.remote_hash = hash.clone();
					p.base_hash = hash;
					p.sync_state = SyncState::Synced;
					p.last_synced_at = now_iso8601();
				}
				actions.push(Action::Uploaded { id });
			}
			SyncState::Conflict => {
				let ancestor = self.store.read_ancestor(&id).await?;
				let resolution = self
					.resolve_conflict_per_policy(ancestor.as_deref(), body, &remote_body, remote_page.version)
					.await?;
				self.apply_conflict_resolution(state, &id, resolution, &mut actions).await?;
			}
			SyncState::Synced | SyncState::RemoteModified => {}
		}

		Ok(actions)
	}

	/// Handle one remote-change event for PageId `id`.
	async fn handle_remote_event(
		&self,
		state: &mut crate::types::DirectoryState,
		id: &PageId,
	) -> Result<Vec<Action>, SyncError> {
		let mut actions = Vec::new();

		let Some(page) = state.pages.get(id).cloned() else {
			// Unknown page: pull it as new.
			let entries = self.remote.enumerate_scope(&Scope::Page(id.clone())).await?;
			if !entries.is_empty() {
				actions.extend(self.pull(Scope::Page(id.clone()), false).await?);
			}
			return Ok(actions);
		};

		let remote_page = match self.remote.get_page(id).await {
			Ok(page) => page,
			Err(RemoteError::NotFound { .. }) => {
				if let Some(p) = state.pages.get_mut(id) {
					p.tombstoned = true;
				}
				return Ok(actions);
			}
			Err(e) => return Err(e.into()),
		};

		if !tokio::fs::try_exists(self.file_path(&page.path)).await.unwrap_or(false) {
			// The tracked file vanished from disk: nothing to diff against,
			// so pull the remote copy down fresh instead of treating the
			// missing file as an empty-body edit.
			actions.extend(self.pull(Scope::Page(id.clone()), true).await?);
			return Ok(actions);
		}

		let content = self.read_local(&page.path).await?;
		let body = strip_frontmatter(&content).1;
		let local_hash = fingerprint(body);
		let remote_body = self.codec.storage_to_markdown(&remote_page.storage_text);
		let remote_hash = fingerprint(&remote_body);

		let local_changed = local_hash != page.local_hash;
		let remote_changed = remote_page.version > page.version || remote_hash != page.remote_hash;
		let sync_state = SyncState::from_changed(local_changed, remote_changed);

		match sync_state {
			SyncState::RemoteModified => {
				let fm = Frontmatter { id: Some(id.clone()), title: Some(remote_page.title.clone()) };
				let rendered = render_frontmatter(&fm, &remote_body);
				self.write_local(&page.path, &rendered).await?;

				if !self.config.dry_run {
					let normalized = normalize(&remote_body);
					self.store.write_ancestor(id, &normalized).await?;
					let hash = fingerprint(&normalized);
					if let Some(p) = state.pages.get_mut(id) {
						p.remote_hash = hash.clone();
						p.base_hash = hash;
						p.version = remote_page.version;
						p.sync_state = SyncState::Synced;
						p.last_synced_at = now_iso8601();
					}
				}
				actions.push(Action::Pulled { id: id.clone() });
			}
			SyncState::Conflict => {
				let ancestor = self.store.read_ancestor(id).await?;
				let resolution = self
					.resolve_conflict_per_policy(ancestor.as_deref(), body, &remote_body, remote_page.version)
					.await?;
				self.apply_conflict_resolution(state, id, resolution, &mut actions).await?;
			}
			SyncState::Synced | SyncState::LocalModified => {}
		}

		Ok(actions)
	}

	async fn resolve_conflict_per_policy(
		&self,
		ancestor: Option<&str>,
		local: &str,
		remote: &str,
		remote_version: u64,
	) -> Result<ConflictResolution, SyncError> {
		match self.config.on_conflict {
			OnConflict::Merge | OnConflict::Prompt => Ok(ConflictResolution::Merged(merge(ancestor, local, remote))),
			OnConflict::Local => Ok(ConflictResolution::AcceptLocal(normalize(local))),
			OnConflict::Remote => {
				Ok(ConflictResolution::AcceptRemote { text: normalize(remote), version: remote_version })
			}
		}
	}

	/// `sync(root, scope, options)`: start the daemon loop. Runs until
	/// `shutdown` resolves (typically a signal future), at which point the
	/// engine stops accepting new events, finishes the in-flight one, and
	/// returns.
	pub async fn sync(
		self: Arc<Self>,
		scope: Scope,
		webhook: Option<(u16, WebhookScopeFilter)>,
		mut shutdown: mpsc::Receiver<()>,
	) -> Result<(), SyncError> {
		let _lock = FileLock::acquire(self.store.lock_path())?;

		let (tx, mut rx) = events::channel();

		let watcher_handle = watcher::spawn(
			self.root.clone(),
			Duration::from_millis(self.config.debounce_window_ms),
			tx.clone(),
		);
		let poller_handle = poller::spawn(
			Arc::new(StateStore::new(&self.root)),
			self.remote.clone(),
			scope,
			Duration::from_secs(self.config.poll_interval_secs),
			tx.clone(),
		);
		let webhook_handle = webhook.map(|(port, filter)| webhook::spawn(port, filter, tx.clone()));
		drop(tx);

		info!("reconciliation daemon started at {}", self.root.display());

		loop {
			tokio::select! {
				_ = shutdown.recv() => {
					info!("shutdown requested, draining current event");
					break;
				}
				maybe_event = rx.recv() => {
					let Some(event) = maybe_event else { break };
					let mut state = match self.store.read_state().await {
						Ok(state) => state,
						Err(e) => {
							warn!("failed to read state: {}", e);
							continue;
						}
					};

					let result = match &event {
						Event::Local { path } => self.handle_local_event(&mut state, path).await,
						Event::Remote { id, .. } => self.handle_remote_event(&mut state, id).await,
					};

					match result {
						Ok(actions) => {
							if !self.config.dry_run {
								state.last_sync = now_iso8601();
								if let Err(e) = self.store.write_state(&state).await {
									warn!("failed to persist state: {}", e);
								}
							}
							for action in actions {
								info!("{:?}", action);
							}
						}
						Err(e) => warn!("event handling failed: {}", e),
					}
				}
			}
		}

		watcher_handle.abort();
		poller_handle.abort();
		if let Some(handle) = webhook_handle {
			handle.abort();
		}
		info!("reconciliation daemon stopped");
		Ok(())
	}
}

/// Strip the non-accepted side from every conflict region, leaving the
/// rest of the file untouched.
fn strip_conflict_regions(content: &str, keep_local: bool) -> String {
	let mut out = String::new();
	let mut mode = Mode::Normal;

	for line in content.lines() {
		match mode {
			Mode::Normal => {
				if line.starts_with(CONFLICT_MARKER_START) {
					mode = Mode::Local;
				} else {
					out.push_str(line);
					out.push('\n');
				}
			}
			Mode::Local => {
				if line.starts_with(CONFLICT_MARKER_SEP) {
					mode = Mode::Remote;
				} else if keep_local {
					out.push_str(line);
					out.push('\n');
				}
			}
			Mode::Remote => {
				if line.starts_with(CONFLICT_MARKER_END) {
					mode = Mode::Normal;
				} else if !keep_local {
					out.push_str(line);
					out.push('\n');
				}
			}
		}
	}
	out
}

enum Mode {
	Normal,
	Local,
	Remote,
}

fn derive_title(body: &str, fallback_path: &str) -> String {
	for line in body.lines() {
		if let Some(heading) = line.strip_prefix("# ") {
			return heading.trim().to_string();
		}
	}
	fallback_path.trim_end_matches(".md").to_string()
}

fn default_path_for(title: &str, id: &PageId) -> String {
	let slug: String = title
		.chars()
		.map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
		.collect();
	let slug = slug.trim_matches('-');
	if slug.is_empty() {
		format!("{}.md", id)
	} else {
		format!("{}.md", slug)
	}
}

/// `lastSyncedAt`/`lastSync` timestamp: UTC, second precision, RFC 3339.
fn now_iso8601() -> String {
	chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// vim: ts=4
