//! Process-exclusive lock on a tracked directory's `.atlcli/.sync.lock`.

use std::path;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::error::SyncError;

/// Global lock file path, used by the signal handler to clean up on
/// SIGTERM/SIGINT without needing access to the `FileLock` value.
static LOCK_FILE_PATH: OnceLock<std::sync::Mutex<Option<path::PathBuf>>> = OnceLock::new();

/// RAII guard on the daemon's exclusive lock. Removed on drop, whether the
/// daemon exits cleanly or via an early return.
pub struct FileLock {
	path: path::PathBuf,
}

impl FileLock {
	/// Acquire the exclusive lock at `lock_path`. Fails with the holding
	/// process's id if the lock is already held.
	pub fn acquire(lock_path: path::PathBuf) -> Result<Self, SyncError> {
		if lock_path.exists() {
			let holder = std::fs::read_to_string(&lock_path).unwrap_or_default();
			return Err(SyncError::LockHeld {
				path: format!("{} (held by pid {})", lock_path.display(), holder.trim()),
			});
		}

		let pid = std::process::id();
		std::fs::write(&lock_path, pid.to_string())?;

		let lock_storage_mutex = LOCK_FILE_PATH.get_or_init(|| std::sync::Mutex::new(None));
		if let Ok(mut lock_storage) = lock_storage_mutex.lock() {
			*lock_storage = Some(lock_path.clone());
		}

		Ok(FileLock { path: lock_path })
	}

	fn remove_now(&self) {
		let _ = std::fs::remove_file(&self.path);
		if let Some(mutex) = LOCK_FILE_PATH.get() {
			if let Ok(mut lock_storage) = mutex.lock() {
				*lock_storage = None;
			}
		}
	}
}

impl Drop for FileLock {
	fn drop(&mut self) {
		self.remove_now();
	}
}

/// Install SIGTERM/SIGINT handlers that release the active lock file before
/// exiting, so a killed daemon never leaves a stale lock behind.
pub fn setup_signal_handlers() {
	tokio::spawn(async {
		use tokio::signal;

		let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(stream) => stream,
			Err(e) => {
				warn!("failed to install SIGTERM handler: {}", e);
				return;
			}
		};

		let mut sigint = match signal::unix::signal(signal::unix::SignalKind::interrupt()) {
			Ok(stream) => stream,
			Err(e) => {
				warn!("failed to install SIGINT handler: {}", e);
				return;
			}
		};

		tokio::select! {
			_ = sigterm.recv() => {
				debug!("received SIGTERM, releasing lock");
				cleanup_lock_file();
				std::process::exit(130);
			}
			_ = sigint.recv() => {
				debug!("received SIGINT, releasing lock");
				cleanup_lock_file();
				std::process::exit(130);
			}
		}
	});
}

fn cleanup_lock_file() {
	if let Some(mutex) = LOCK_FILE_PATH.get() {
		if let Ok(lock_storage) = mutex.lock() {
			if let Some(lock_path) = lock_storage.as_ref() {
				let _ = std::fs::remove_file(lock_path);
				info!("lock file cleaned up on signal termination: {}", lock_path.display());
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn acquire_creates_lock_with_pid() {
		let dir = TempDir::new().unwrap();
		let lock_path = dir.path().join(".sync.lock");
		let lock = FileLock::acquire(lock_path.clone()).unwrap();
		assert!(lock_path.exists());
		let content = std::fs::read_to_string(&lock_path).unwrap();
		assert_eq!(content, std::process::id().to_string());
	}

	#[test]
	fn drop_releases_lock() {
		let dir = TempDir::new().unwrap();
		let lock_path = dir.path().join(".sync.lock");
		{
			let _lock = FileLock::acquire(lock_path.clone()).unwrap();
			assert!(lock_path.exists());
		}
		assert!(!lock_path.exists());
	}

	#[test]
	fn second_acquire_fails_with_holder_pid() {
		let dir = TempDir::new().unwrap();
		let lock_path = dir.path().join(".sync.lock");
		let _lock1 = FileLock::acquire(lock_path.clone()).unwrap();

		let result = FileLock::acquire(lock_path);
		assert!(result.is_err());
		match result {
			Err(SyncError::LockHeld { path }) => assert!(path.contains(&std::process::id().to_string())),
			other => panic!("expected LockHeld, got {:?}", other),
		}
	}
}

// vim: ts=4
