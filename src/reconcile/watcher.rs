//! Filesystem watcher producer task.
//!
//! Emits a `Event::Local` for each modified `.md` file under the tracked
//! root, debounced: repeated events on the same path within the configured
//! window are coalesced into one. Changes under `.atlcli/` are ignored.

use notify::{RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use super::events::Event;
use crate::state::ATLCLI_DIR;

/// Spawn the watcher task. Returns a handle the caller can abort on
/// shutdown; the underlying `notify` watcher is dropped along with it.
pub fn spawn(root: PathBuf, debounce_window: Duration, tx: mpsc::Sender<Event>) -> tokio::task::JoinHandle<()> {
	tokio::spawn(async move {
		let (raw_tx, mut raw_rx) = mpsc::channel::<PathBuf>(256);
		let overflowed = Arc::new(AtomicBool::new(false));

		let root_for_watcher = root.clone();
		let overflowed_for_watcher = overflowed.clone();
		let mut watcher = match notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
			let event = match res {
				Ok(event) => event,
				Err(e) => {
					warn!("watcher error: {}", e);
					return;
				}
			};
			for path in event.paths {
				let Ok(relative) = path.strip_prefix(&root_for_watcher) else { continue };
				if relative.starts_with(ATLCLI_DIR) {
					continue;
				}
				if relative.extension().and_then(|e| e.to_str()) != Some("md") {
					continue;
				}
				if raw_tx.try_send(relative.to_path_buf()).is_err() {
					overflowed_for_watcher.store(true, Ordering::SeqCst);
				}
			}
		}) {
			Ok(w) => w,
			Err(e) => {
				warn!("failed to start filesystem watcher: {}", e);
				return;
			}
		};

		if let Err(e) = watcher.watch(Path::new(&root), RecursiveMode::Recursive) {
			warn!("failed to watch {}: {}", root.display(), e);
			return;
		}

		debounce_loop(&mut raw_rx, &overflowed, debounce_window, &tx).await;
	})
}

/// Per-path timers keyed in a map, reset on each event; fire a batched
/// `Event::Local` once a path has been quiet for the debounce window.
async fn debounce_loop(
	raw_rx: &mut mpsc::Receiver<PathBuf>,
	overflowed: &AtomicBool,
	window: Duration,
	tx: &mpsc::Sender<Event>,
) {
	let mut pending: HashMap<PathBuf, tokio::time::Instant> = HashMap::new();
	let mut tick = tokio::time::interval(window.min(Duration::from_millis(50)).max(Duration::from_millis(10)));

	loop {
		tokio::select! {
			maybe_path = raw_rx.recv() => {
				match maybe_path {
					Some(path) => {
						pending.insert(path, tokio::time::Instant::now() + window);
					}
					None => break,
				}
			}
			_ = tick.tick() => {
				if overflowed.swap(false, Ordering::SeqCst) {
					pending.clear();
					// A full rescan is the caller's responsibility once it
					// sees events dry up; nothing further to do here beyond
					// dropping stale per-path timers.
				}

				let now = tokio::time::Instant::now();
				let ready: Vec<PathBuf> =
					pending.iter().filter(|(_, due)| **due <= now).map(|(p, _)| p.clone()).collect();
				for path in ready {
					pending.remove(&path);
					if tx.send(Event::Local { path }).await.is_err() {
						return;
					}
				}
			}
		}
	}
}

// vim: ts=4
