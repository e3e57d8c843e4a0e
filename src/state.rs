//! Durable, crash-safe persistence of `DirectoryState`, `DirectoryConfig`,
//! and the ancestor content cache under `.atlcli/`.

use std::path::{Path, PathBuf};

use crate::error::StateError;
use crate::types::{DirectoryConfig, DirectoryState, PageId, SCHEMA_VERSION};

pub const ATLCLI_DIR: &str = ".atlcli";
const CONFIG_FILE: &str = "config.json";
const STATE_FILE: &str = "state.json";
const CACHE_DIR: &str = "cache";
const LOCK_FILE: &str = ".sync.lock";

/// Walk upward from `start_path` until a `.atlcli/` directory is found.
pub fn locate(start_path: &Path) -> Option<PathBuf> {
	let mut current = if start_path.is_dir() { Some(start_path) } else { start_path.parent() };

	while let Some(dir) = current {
		if dir.join(ATLCLI_DIR).is_dir() {
			return Some(dir.to_path_buf());
		}
		current = dir.parent();
	}
	None
}

/// Durable state for one tracked directory.
pub struct StateStore {
	root: PathBuf,
}

impl StateStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		StateStore { root: root.into() }
	}

	fn atlcli_dir(&self) -> PathBuf {
		self.root.join(ATLCLI_DIR)
	}

	pub fn lock_path(&self) -> PathBuf {
		self.atlcli_dir().join(LOCK_FILE)
	}

	/// Create the `.atlcli/` layout; refuses if already initialized.
	pub async fn init(&self, config: &DirectoryConfig) -> Result<(), StateError> {
		let dir = self.atlcli_dir();
		if dir.is_dir() {
			return Err(StateError::AlreadyInitialized { path: self.root.display().to_string() });
		}

		tokio::fs::create_dir_all(dir.join(CACHE_DIR)).await?;
		self.write_config(config).await?;
		self.write_state(&DirectoryState::new()).await?;
		Ok(())
	}

	fn require_initialized(&self) -> Result<(), StateError> {
		if !self.atlcli_dir().is_dir() {
			return Err(StateError::NotInitialized { path: self.root.display().to_string() });
		}
		Ok(())
	}

	pub async fn read_config(&self) -> Result<DirectoryConfig, StateError> {
		self.require_initialized()?;
		let path = self.atlcli_dir().join(CONFIG_FILE);
		let contents = tokio::fs::read_to_string(&path).await?;
		let config: DirectoryConfig = serde_json::from_str(&contents)
			.map_err(|e| StateError::Corrupt { message: format!("config.json: {}", e) })?;
		if config.schema_version != SCHEMA_VERSION {
			return Err(StateError::SchemaMismatch {
				found: config.schema_version,
				expected: SCHEMA_VERSION,
			});
		}
		Ok(config)
	}

	pub async fn write_config(&self, config: &DirectoryConfig) -> Result<(), StateError> {
		let path = self.atlcli_dir().join(CONFIG_FILE);
		let json = serde_json::to_string_pretty(config)
			.map_err(|e| StateError::Corrupt { message: e.to_string() })?;
		atomic_write(&path, json.as_bytes()).await?;
		Ok(())
	}

	pub async fn read_state(&self) -> Result<DirectoryState, StateError> {
		self.require_initialized()?;
		let path = self.atlcli_dir().join(STATE_FILE);
		let contents = tokio::fs::read_to_string(&path).await?;
		let state: DirectoryState = serde_json::from_str(&contents)
			.map_err(|e| StateError::Corrupt { message: format!("state.json: {}", e) })?;
		if state.schema_version != SCHEMA_VERSION {
			return Err(StateError::SchemaMismatch {
				found: state.schema_version,
				expected: SCHEMA_VERSION,
			});
		}
		if !state.bijection_holds() {
			return Err(StateError::Corrupt {
				message: "pages/pathIndex bijection violated in state.json".to_string(),
			});
		}
		Ok(state)
	}

	/// Atomic replace: write to a temp file in the same directory, then
	/// rename over the target. A crash mid-write leaves the old file intact.
	pub async fn write_state(&self, state: &DirectoryState) -> Result<(), StateError> {
		let path = self.atlcli_dir().join(STATE_FILE);
		let json = serde_json::to_string_pretty(state)
			.map_err(|e| StateError::Corrupt { message: e.to_string() })?;
		atomic_write(&path, json.as_bytes()).await?;
		Ok(())
	}

	fn ancestor_path(&self, id: &PageId) -> PathBuf {
		self.atlcli_dir().join(CACHE_DIR).join(id)
	}

	pub async fn read_ancestor(&self, id: &PageId) -> Result<Option<String>, StateError> {
		let path = self.ancestor_path(id);
		match tokio::fs::read_to_string(&path).await {
			Ok(text) => Ok(Some(text)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StateError::Io(e)),
		}
	}

	pub async fn write_ancestor(&self, id: &PageId, text: &str) -> Result<(), StateError> {
		let path = self.ancestor_path(id);
		atomic_write(&path, text.as_bytes()).await?;
		Ok(())
	}

	pub async fn remove_ancestor(&self, id: &PageId) -> Result<(), StateError> {
		let path = self.ancestor_path(id);
		match tokio::fs::remove_file(&path).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StateError::Io(e)),
		}
	}
}

/// Write `contents` to a temp file beside `path`, then rename it into
/// place. On POSIX, rename is atomic within the same filesystem, so readers
/// never observe a partially written file.
async fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), StateError> {
	let dir = path.parent().unwrap_or_else(|| Path::new("."));
	tokio::fs::create_dir_all(dir).await?;

	let tmp_name = format!(
		".{}.tmp-{}",
		path.file_name().and_then(|n| n.to_str()).unwrap_or("state"),
		std::process::id()
	);
	let tmp_path = dir.join(tmp_name);

	tokio::fs::write(&tmp_path, contents).await?;
	tokio::fs::rename(&tmp_path, path).await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn default_config() -> DirectoryConfig {
		DirectoryConfig {
			schema_version: SCHEMA_VERSION,
			space_key: "SPC".to_string(),
			base_url: "https://example.atlassian.net/wiki".to_string(),
			profile: "default".to_string(),
			settings: Default::default(),
		}
	}

	#[tokio::test]
	async fn init_creates_layout() {
		let dir = TempDir::new().unwrap();
		let store = StateStore::new(dir.path());
		store.init(&default_config()).await.unwrap();

		assert!(dir.path().join(".atlcli/config.json").is_file());
		assert!(dir.path().join(".atlcli/state.json").is_file());
		assert!(dir.path().join(".atlcli/cache").is_dir());
	}

	#[tokio::test]
	async fn init_twice_refuses() {
		let dir = TempDir::new().unwrap();
		let store = StateStore::new(dir.path());
		store.init(&default_config()).await.unwrap();
		let err = store.init(&default_config()).await.unwrap_err();
		assert!(matches!(err, StateError::AlreadyInitialized { .. }));
	}

	#[tokio::test]
	async fn read_state_round_trips() {
		let dir = TempDir::new().unwrap();
		let store = StateStore::new(dir.path());
		store.init(&default_config()).await.unwrap();

		let state = store.read_state().await.unwrap();
		assert_eq!(state.schema_version, SCHEMA_VERSION);
		assert!(state.pages.is_empty());
	}

	#[tokio::test]
	async fn not_initialized_is_reported() {
		let dir = TempDir::new().unwrap();
		let store = StateStore::new(dir.path());
		let err = store.read_state().await.unwrap_err();
		assert!(matches!(err, StateError::NotInitialized { .. }));
	}

	#[tokio::test]
	async fn ancestor_cache_round_trips() {
		let dir = TempDir::new().unwrap();
		let store = StateStore::new(dir.path());
		store.init(&default_config()).await.unwrap();

		assert_eq!(store.read_ancestor(&"P1".to_string()).await.unwrap(), None);
		store.write_ancestor(&"P1".to_string(), "Hi\n").await.unwrap();
		assert_eq!(store.read_ancestor(&"P1".to_string()).await.unwrap(), Some("Hi\n".to_string()));
	}

	#[tokio::test]
	async fn locate_walks_upward() {
		let dir = TempDir::new().unwrap();
		let store = StateStore::new(dir.path());
		store.init(&default_config()).await.unwrap();

		let nested = dir.path().join("a/b/c");
		tokio::fs::create_dir_all(&nested).await.unwrap();

		assert_eq!(locate(&nested), Some(dir.path().to_path_buf()));
	}

	#[tokio::test]
	async fn locate_returns_none_outside_tracked_tree() {
		let dir = TempDir::new().unwrap();
		assert_eq!(locate(dir.path()), None);
	}
}

// vim: ts=4
