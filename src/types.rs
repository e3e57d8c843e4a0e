//! Core data model: page identity, per-page and per-directory sync state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PageId = String;

/// Current schema version for `config.json`/`state.json`.
pub const SCHEMA_VERSION: u32 = 1;

/// Per-page sync state, computed from the local/remote/base hash triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncState {
	Synced,
	LocalModified,
	RemoteModified,
	Conflict,
}

impl SyncState {
	/// The state table from the reconciliation spec: local/remote changed
	/// booleans map deterministically onto one of the four states.
	pub fn from_changed(local_changed: bool, remote_changed: bool) -> Self {
		match (local_changed, remote_changed) {
			(false, false) => SyncState::Synced,
			(true, false) => SyncState::LocalModified,
			(false, true) => SyncState::RemoteModified,
			(true, true) => SyncState::Conflict,
		}
	}
}

/// The per-page record in `DirectoryState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
	pub id: PageId,
	pub path: String,
	pub title: String,
	pub space_key: String,
	pub version: u64,
	pub last_synced_at: String,
	pub local_hash: String,
	pub remote_hash: String,
	pub base_hash: String,
	pub sync_state: SyncState,
	pub parent_id: Option<PageId>,
	#[serde(default)]
	pub tombstoned: bool,
}

/// Recognized per-directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySettings {
	#[serde(default)]
	pub auto_create_pages: bool,
	#[serde(default = "default_true")]
	pub preserve_hierarchy: bool,
	#[serde(default)]
	pub default_parent_id: Option<PageId>,
}

fn default_true() -> bool {
	true
}

impl Default for DirectorySettings {
	fn default() -> Self {
		DirectorySettings {
			auto_create_pages: false,
			preserve_hierarchy: true,
			default_parent_id: None,
		}
	}
}

/// `config.json`: the per-directory remote binding and settings, everything
/// in `DirectoryState` except the per-page maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryConfig {
	pub schema_version: u32,
	pub space_key: String,
	pub base_url: String,
	pub profile: String,
	#[serde(default)]
	pub settings: DirectorySettings,
}

/// `state.json`: pages, path index, and last-sync timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryState {
	pub schema_version: u32,
	pub last_sync: String,
	pub pages: BTreeMap<PageId, PageState>,
	pub path_index: BTreeMap<String, PageId>,
}

impl DirectoryState {
	pub fn new() -> Self {
		DirectoryState {
			schema_version: SCHEMA_VERSION,
			last_sync: String::new(),
			pages: BTreeMap::new(),
			path_index: BTreeMap::new(),
		}
	}

	/// True if `pages ↔ pathIndex` are mutually consistent for every entry.
	pub fn bijection_holds(&self) -> bool {
		for (id, page) in &self.pages {
			match self.path_index.get(&page.path) {
				Some(indexed_id) if indexed_id == id => {}
				_ => return false,
			}
		}
		for (path, id) in &self.path_index {
			match self.pages.get(id) {
				Some(page) if &page.path == path => {}
				_ => return false,
			}
		}
		true
	}

	/// Insert or replace a page, keeping `pathIndex` in lockstep. Returns an
	/// error instead of silently leaving the two maps inconsistent if the
	/// new path collides with a different page's entry.
	pub fn upsert_page(&mut self, page: PageState) -> Result<(), crate::error::StateError> {
		if let Some(existing_id) = self.path_index.get(&page.path) {
			if existing_id != &page.id {
				return Err(crate::error::StateError::BijectionViolation {
					path: page.path.clone(),
					id: page.id.clone(),
				});
			}
		}
		// Drop any stale path-index entry pointing at this page's old path.
		if let Some(old) = self.pages.get(&page.id) {
			if old.path != page.path {
				self.path_index.remove(&old.path);
			}
		}
		self.path_index.insert(page.path.clone(), page.id.clone());
		self.pages.insert(page.id.clone(), page);
		Ok(())
	}

	pub fn remove_page(&mut self, id: &str) {
		if let Some(page) = self.pages.remove(id) {
			self.path_index.remove(&page.path);
		}
	}
}

impl Default for DirectoryState {
	fn default() -> Self {
		Self::new()
	}
}

/// A filter over remote pages, used by `pull` and the poller.
#[derive(Debug, Clone)]
pub enum Scope {
	Page(PageId),
	Subtree(PageId),
	Space,
}

/// Conflict resolution policy accepted by `sync --on-conflict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
	Merge,
	Local,
	Remote,
	Prompt,
}

impl Default for OnConflict {
	fn default() -> Self {
		OnConflict::Merge
	}
}

impl std::str::FromStr for OnConflict {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"merge" => Ok(OnConflict::Merge),
			"local" => Ok(OnConflict::Local),
			"remote" => Ok(OnConflict::Remote),
			"prompt" => Ok(OnConflict::Prompt),
			other => Err(format!("unrecognized on-conflict value: {}", other)),
		}
	}
}

/// Which side(s) a `resolve` call keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
	Local,
	Remote,
	Merged,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn state_table_matches_spec() {
		assert_eq!(SyncState::from_changed(false, false), SyncState::Synced);
		assert_eq!(SyncState::from_changed(true, false), SyncState::LocalModified);
		assert_eq!(SyncState::from_changed(false, true), SyncState::RemoteModified);
		assert_eq!(SyncState::from_changed(true, true), SyncState::Conflict);
	}

	fn page(id: &str, path: &str) -> PageState {
		PageState {
			id: id.to_string(),
			path: path.to_string(),
			title: "t".to_string(),
			space_key: "SPC".to_string(),
			version: 1,
			last_synced_at: "2026-01-01T00:00:00Z".to_string(),
			local_hash: "h".to_string(),
			remote_hash: "h".to_string(),
			base_hash: "h".to_string(),
			sync_state: SyncState::Synced,
			parent_id: None,
			tombstoned: false,
		}
	}

	#[test]
	fn upsert_maintains_bijection() {
		let mut state = DirectoryState::new();
		state.upsert_page(page("P1", "intro.md")).unwrap();
		assert!(state.bijection_holds());
		assert_eq!(state.path_index.get("intro.md"), Some(&"P1".to_string()));
	}

	#[test]
	fn upsert_rejects_path_collision() {
		let mut state = DirectoryState::new();
		state.upsert_page(page("P1", "intro.md")).unwrap();
		let err = state.upsert_page(page("P2", "intro.md")).unwrap_err();
		assert!(matches!(err, crate::error::StateError::BijectionViolation { .. }));
	}

	#[test]
	fn rename_updates_path_index() {
		let mut state = DirectoryState::new();
		state.upsert_page(page("P1", "intro.md")).unwrap();
		let mut renamed = page("P1", "welcome.md");
		renamed.version = 1;
		state.upsert_page(renamed).unwrap();
		assert!(state.bijection_holds());
		assert!(!state.path_index.contains_key("intro.md"));
		assert_eq!(state.path_index.get("welcome.md"), Some(&"P1".to_string()));
	}

	#[test]
	fn remove_page_clears_path_index() {
		let mut state = DirectoryState::new();
		state.upsert_page(page("P1", "intro.md")).unwrap();
		state.remove_page("P1");
		assert!(state.path_index.is_empty());
		assert!(state.bijection_holds());
	}
}

// vim: ts=4
