//! End-to-end scenarios against a tracked directory and an in-memory remote.

use std::sync::Arc;
use std::time::Duration;

use atlcli_sync::config::Config;
use atlcli_sync::format_codec::MarkdownStorageCodec;
use atlcli_sync::reconcile::{Action, ReconciliationEngine};
use atlcli_sync::remote::{MockRemoteStore, NewPage, RemoteStore};
use atlcli_sync::state::StateStore;
use atlcli_sync::types::{Accept, Scope};
use tempfile::TempDir;

async fn tracked_md_path(dir: &TempDir) -> std::path::PathBuf {
	let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
	while let Some(entry) = entries.next_entry().await.unwrap() {
		let path = entry.path();
		if path.extension().and_then(|e| e.to_str()) == Some("md") {
			return path;
		}
	}
	panic!("no tracked .md file found in {}", dir.path().display());
}

fn engine(dir: &TempDir, remote: Arc<MockRemoteStore>) -> ReconciliationEngine {
	ReconciliationEngine::new(dir.path(), remote, Arc::new(MarkdownStorageCodec), Config::default())
}

async fn seed_remote_page(remote: &MockRemoteStore, title: &str, body_storage: &str) -> String {
	let created = remote
		.create_page(NewPage {
			space_key: "SPC".to_string(),
			title: title.to_string(),
			storage_text: body_storage.to_string(),
			parent_id: None,
		})
		.await
		.unwrap();
	created.id
}

#[tokio::test]
async fn pull_then_status_reports_synced() {
	let dir = TempDir::new().unwrap();
	let remote = Arc::new(MockRemoteStore::new());
	seed_remote_page(&remote, "Guide", "<p>Hello there</p>\n").await;

	let e = engine(&dir, remote);
	e.init("SPC", "https://example.atlassian.net/wiki", "default").await.unwrap();

	let actions = e.pull(Scope::Space, false).await.unwrap();
	assert!(actions.iter().any(|a| matches!(a, Action::Pulled { .. })));

	let report = e.status().await.unwrap();
	assert_eq!(report.synced, 1);
	assert_eq!(report.local_modified, 0);
	assert_eq!(report.conflict, 0);
}

#[tokio::test]
async fn local_edit_then_push_uploads_and_bumps_version() {
	let dir = TempDir::new().unwrap();
	let remote = Arc::new(MockRemoteStore::new());
	let id = seed_remote_page(&remote, "Guide", "<p>Hello there</p>\n").await;

	let e = engine(&dir, remote.clone());
	e.init("SPC", "https://example.atlassian.net/wiki", "default").await.unwrap();
	e.pull(Scope::Space, false).await.unwrap();

	let report = e.status().await.unwrap();
	assert_eq!(report.synced, 1);

	let md_path = tracked_md_path(&dir).await;
	let original = tokio::fs::read_to_string(&md_path).await.unwrap();
	let edited = original.replace("Hello there", "Hello there, edited locally");
	tokio::fs::write(&md_path, edited).await.unwrap();

	let status = e.status().await.unwrap();
	assert_eq!(status.local_modified, 1);

	let actions = e.push().await.unwrap();
	assert!(actions.iter().any(|a| matches!(a, Action::Uploaded { .. })));

	let remote_page = remote.get_page(&id).await.unwrap();
	assert_eq!(remote_page.version, 2);
	assert!(remote_page.storage_text.contains("edited locally"));

	let report = e.status().await.unwrap();
	assert_eq!(report.synced, 1);
	assert_eq!(report.local_modified, 0);
}

#[tokio::test]
async fn concurrent_edit_conflicts_then_resolves() {
	let dir = TempDir::new().unwrap();
	let remote = Arc::new(MockRemoteStore::new());
	let id = seed_remote_page(&remote, "Guide", "<p>Hi</p>\n").await;

	let e = engine(&dir, remote.clone());
	e.init("SPC", "https://example.atlassian.net/wiki", "default").await.unwrap();
	e.pull(Scope::Space, false).await.unwrap();

	let md_path = tracked_md_path(&dir).await;
	let original = tokio::fs::read_to_string(&md_path).await.unwrap();
	let local_edit = original.replace("Hi", "Hi local");
	tokio::fs::write(&md_path, &local_edit).await.unwrap();

	// Someone else edits the same page remotely in the meantime.
	remote.edit_remotely(&id, "<p>Hi remote</p>\n").await;

	let actions = e.push().await.unwrap();
	assert!(actions.iter().any(|a| matches!(a, Action::MarkedConflict { .. })));

	let status = e.status().await.unwrap();
	assert_eq!(status.conflict, 1);

	let content = tokio::fs::read_to_string(&md_path).await.unwrap();
	assert!(content.contains("<<<<<<< LOCAL"));
	assert!(content.contains("Hi local"));
	assert!(content.contains("Hi remote"));

	e.resolve(&md_path, Accept::Local).await.unwrap();
	let resolved = tokio::fs::read_to_string(&md_path).await.unwrap();
	assert!(!resolved.contains("<<<<<<<"));
	assert!(resolved.contains("Hi local"));
	assert!(!resolved.contains("Hi remote"));
}

#[tokio::test]
async fn add_registers_untracked_file_as_new_page() {
	let dir = TempDir::new().unwrap();
	let remote = Arc::new(MockRemoteStore::new());

	let e = engine(&dir, remote.clone());
	e.init("SPC", "https://example.atlassian.net/wiki", "default").await.unwrap();

	let file = dir.path().join("notes.md");
	tokio::fs::write(&file, "# Notes\n\nSome content.\n").await.unwrap();

	let id = e.add(&file, None, None).await.unwrap();
	let remote_page = remote.get_page(&id).await.unwrap();
	assert_eq!(remote_page.title, "Notes");

	let report = e.status().await.unwrap();
	assert_eq!(report.synced, 1);
}

#[tokio::test]
async fn pull_skips_locally_diverged_file_unless_forced() {
	let dir = TempDir::new().unwrap();
	let remote = Arc::new(MockRemoteStore::new());
	let id = seed_remote_page(&remote, "Guide", "<p>Hi</p>\n").await;

	let e = engine(&dir, remote.clone());
	e.init("SPC", "https://example.atlassian.net/wiki", "default").await.unwrap();
	e.pull(Scope::Space, false).await.unwrap();

	let md_path = tracked_md_path(&dir).await;
	let original = tokio::fs::read_to_string(&md_path).await.unwrap();
	tokio::fs::write(&md_path, original.replace("Hi", "Hi, diverged")).await.unwrap();

	remote.edit_remotely(&id, "<p>Hi from remote again</p>\n").await;

	let actions = e.pull(Scope::Space, false).await.unwrap();
	assert!(!actions.iter().any(|a| matches!(a, Action::Pulled { id: pulled } if pulled == &id)));

	let content = tokio::fs::read_to_string(&md_path).await.unwrap();
	assert!(content.contains("Hi, diverged"));

	let actions = e.pull(Scope::Space, true).await.unwrap();
	assert!(actions.iter().any(|a| matches!(a, Action::Pulled { id: pulled } if pulled == &id)));
	let content = tokio::fs::read_to_string(&md_path).await.unwrap();
	assert!(content.contains("Hi from remote again"));
}

#[tokio::test]
async fn dry_run_push_reports_without_mutating() {
	let dir = TempDir::new().unwrap();
	let remote = Arc::new(MockRemoteStore::new());
	let id = seed_remote_page(&remote, "Guide", "<p>Hello</p>\n").await;

	let e = engine(&dir, remote.clone());
	e.init("SPC", "https://example.atlassian.net/wiki", "default").await.unwrap();
	e.pull(Scope::Space, false).await.unwrap();

	let md_path = tracked_md_path(&dir).await;
	let original = tokio::fs::read_to_string(&md_path).await.unwrap();
	tokio::fs::write(&md_path, original.replace("Hello", "Hello, dry run edit")).await.unwrap();

	let dry_run_engine = ReconciliationEngine::new(
		dir.path(),
		remote.clone(),
		Arc::new(MarkdownStorageCodec),
		Config { dry_run: true, ..Config::default() },
	);
	dry_run_engine.push().await.unwrap();

	let remote_page = remote.get_page(&id).await.unwrap();
	assert_eq!(remote_page.version, 1, "dry-run push must not mutate the remote");
}

#[tokio::test]
async fn daemon_picks_up_remote_edit_via_poller() {
	let dir = TempDir::new().unwrap();
	let remote = Arc::new(MockRemoteStore::new());
	let id = seed_remote_page(&remote, "Guide", "<p>Hi</p>\n").await;

	let e = engine(&dir, remote.clone());
	e.init("SPC", "https://example.atlassian.net/wiki", "default").await.unwrap();
	e.pull(Scope::Space, false).await.unwrap();

	// Someone edits the page remotely before the daemon ever starts, so the
	// poller's immediate first tick is what has to notice it.
	remote.edit_remotely(&id, "<p>Hi from the poller</p>\n").await;

	let daemon = Arc::new(ReconciliationEngine::new(
		dir.path(),
		remote.clone(),
		Arc::new(MarkdownStorageCodec),
		Config { poll_interval_secs: 1, ..Config::default() },
	));
	let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel(1);
	let handle = tokio::spawn(daemon.clone().sync(Scope::Space, None, shutdown_rx));

	tokio::time::sleep(Duration::from_millis(1500)).await;
	let _ = shutdown_tx.send(()).await;
	handle.await.unwrap().unwrap();

	let md_path = tracked_md_path(&dir).await;
	let content = tokio::fs::read_to_string(&md_path).await.unwrap();
	assert!(content.contains("Hi from the poller"));

	let report = daemon.status().await.unwrap();
	assert_eq!(report.synced, 1);
	assert_eq!(report.remote_modified, 0);
}

#[tokio::test]
async fn daemon_tracks_rename_through_frontmatter_id() {
	let dir = TempDir::new().unwrap();
	let remote = Arc::new(MockRemoteStore::new());
	let id = seed_remote_page(&remote, "Guide", "<p>Hi</p>\n").await;

	let e = engine(&dir, remote.clone());
	e.init("SPC", "https://example.atlassian.net/wiki", "default").await.unwrap();
	e.pull(Scope::Space, false).await.unwrap();

	let old_path = tracked_md_path(&dir).await;
	let new_path = dir.path().join("renamed.md");
	tokio::fs::rename(&old_path, &new_path).await.unwrap();

	let daemon = Arc::new(ReconciliationEngine::new(
		dir.path(),
		remote.clone(),
		Arc::new(MarkdownStorageCodec),
		Config { debounce_window_ms: 50, ..Config::default() },
	));
	let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel(1);
	let handle = tokio::spawn(daemon.clone().sync(Scope::Space, None, shutdown_rx));

	tokio::time::sleep(Duration::from_millis(500)).await;
	let _ = shutdown_tx.send(()).await;
	handle.await.unwrap().unwrap();

	let state = StateStore::new(dir.path()).read_state().await.unwrap();
	let old_relative = old_path.file_name().unwrap().to_str().unwrap();
	assert!(!state.path_index.contains_key(old_relative), "old path should no longer be indexed");
	assert_eq!(state.path_index.get("renamed.md"), Some(&id));
	assert_eq!(state.pages.get(&id).map(|p| p.path.as_str()), Some("renamed.md"));
}
