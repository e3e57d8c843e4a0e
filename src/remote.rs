//! `RemoteStore`: the abstract collaborator interface to the remote wiki.
//!
//! Authentication, HTTP transport, and retry/backoff are explicitly out of
//! scope; this module only defines the contract the Reconciliation Engine
//! depends on, plus an in-memory mock so the engine is testable without a
//! real server.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use crate::error::RemoteError;
use crate::types::{PageId, Scope};

/// A page as returned by the remote.
#[derive(Debug, Clone)]
pub struct RemotePage {
	pub id: PageId,
	pub title: String,
	pub space_key: String,
	pub version: u64,
	pub storage_text: String,
	pub parent_id: Option<PageId>,
}

/// Minimal summary returned by `search_pages`.
#[derive(Debug, Clone)]
pub struct PageSummary {
	pub id: PageId,
	pub title: String,
}

/// Minimal summary returned by `enumerate_scope`, used by the poller.
#[derive(Debug, Clone)]
pub struct ScopeEntry {
	pub id: PageId,
	pub version: u64,
	pub title: String,
}

/// Fields supplied when creating a new remote page.
#[derive(Debug, Clone)]
pub struct NewPage {
	pub space_key: String,
	pub title: String,
	pub storage_text: String,
	pub parent_id: Option<PageId>,
}

/// Fields supplied when updating an existing remote page. `version` is the
/// caller's recorded version; servers using optimistic concurrency reject a
/// stale one with `RemoteError::VersionConflict`.
#[derive(Debug, Clone)]
pub struct PageUpdate {
	pub id: PageId,
	pub title: String,
	pub storage_text: String,
	pub version: u64,
}

/// The abstract remote wiki collaborator.
#[async_trait]
pub trait RemoteStore: Send + Sync {
	async fn get_page(&self, id: &str) -> Result<RemotePage, RemoteError>;
	async fn search_pages(&self, query: &str, limit: usize) -> Result<Vec<PageSummary>, RemoteError>;
	async fn create_page(&self, page: NewPage) -> Result<RemotePage, RemoteError>;
	async fn update_page(&self, update: PageUpdate) -> Result<RemotePage, RemoteError>;
	async fn enumerate_scope(&self, scope: &Scope) -> Result<Vec<ScopeEntry>, RemoteError>;
}

/// An in-memory `RemoteStore`, used by tests and by callers experimenting
/// without a live wiki.
#[derive(Default)]
pub struct MockRemoteStore {
	pages: Mutex<BTreeMap<PageId, RemotePage>>,
	next_id: Mutex<u64>,
}

impl MockRemoteStore {
	pub fn new() -> Self {
		Self { pages: Mutex::new(BTreeMap::new()), next_id: Mutex::new(1) }
	}

	/// Seed a page directly, bypassing `create_page`'s id assignment — used
	/// by tests that need a known, pre-existing remote page.
	pub async fn seed(&self, page: RemotePage) {
		self.pages.lock().await.insert(page.id.clone(), page);
	}

	/// Overwrite an existing page's storage text and bump its version,
	/// simulating an edit made by someone else on the remote.
	pub async fn edit_remotely(&self, id: &str, storage_text: &str) {
		if let Some(page) = self.pages.lock().await.get_mut(id) {
			page.storage_text = storage_text.to_string();
			page.version += 1;
		}
	}

	pub async fn remove(&self, id: &str) {
		self.pages.lock().await.remove(id);
	}
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
	async fn get_page(&self, id: &str) -> Result<RemotePage, RemoteError> {
		self.pages
			.lock()
			.await
			.get(id)
			.cloned()
			.ok_or_else(|| RemoteError::NotFound { id: id.to_string() })
	}

	async fn search_pages(&self, query: &str, limit: usize) -> Result<Vec<PageSummary>, RemoteError> {
		let pages = self.pages.lock().await;
		Ok(pages
			.values()
			.filter(|p| p.title.to_lowercase().contains(&query.to_lowercase()))
			.take(limit)
			.map(|p| PageSummary { id: p.id.clone(), title: p.title.clone() })
			.collect())
	}

	async fn create_page(&self, page: NewPage) -> Result<RemotePage, RemoteError> {
		let mut next_id = self.next_id.lock().await;
		let id = format!("P{}", *next_id);
		*next_id += 1;

		let created = RemotePage {
			id: id.clone(),
			title: page.title,
			space_key: page.space_key,
			version: 1,
			storage_text: page.storage_text,
			parent_id: page.parent_id,
		};
		self.pages.lock().await.insert(id, created.clone());
		Ok(created)
	}

	async fn update_page(&self, update: PageUpdate) -> Result<RemotePage, RemoteError> {
		let mut pages = self.pages.lock().await;
		let page =
			pages.get_mut(&update.id).ok_or_else(|| RemoteError::NotFound { id: update.id.clone() })?;

		if update.version < page.version {
			return Err(RemoteError::VersionConflict { id: update.id.clone(), expected: page.version });
		}

		page.title = update.title;
		page.storage_text = update.storage_text;
		page.version += 1;
		Ok(page.clone())
	}

	async fn enumerate_scope(&self, scope: &Scope) -> Result<Vec<ScopeEntry>, RemoteError> {
		let pages = self.pages.lock().await;
		let matches = |p: &&RemotePage| match scope {
			Scope::Page(id) => &p.id == id,
			Scope::Subtree(root) => p.parent_id.as_deref() == Some(root.as_str()) || &p.id == root,
			Scope::Space => true,
		};
		Ok(pages
			.values()
			.filter(matches)
			.map(|p| ScopeEntry { id: p.id.clone(), version: p.version, title: p.title.clone() })
			.collect())
	}
}


// vim: ts=4
