//! Error types for the sync engine

use std::error::Error;
use std::fmt;
use std::io;

/// Helper to reduce `Box::new()` boilerplate when wrapping nested errors.
#[inline]
pub fn boxed_error<E: Error + Send + Sync + 'static>(e: E) -> Box<dyn Error + Send + Sync> {
	Box::new(e)
}

/// Main error type for sync operations.
///
/// Covers the taxonomy the reconciliation engine distinguishes: usage mistakes,
/// auth failures, transient network errors, integrity violations and the
/// remote-deleted (tombstone) case. `Conflict` is deliberately not a variant
/// here: a conflict is a result of the merge engine, not a failure.
#[derive(Debug)]
pub enum SyncError {
	/// Bad arguments, missing required fields, or an operation attempted
	/// against a root that isn't a tracked directory.
	Usage { message: String },

	/// The remote rejected credentials. Never retried.
	Auth { message: String },

	/// Remote unreachable or returned a server error. Retried only by the
	/// next poll/event, never inline.
	Network { message: String },

	/// I/O error performing a local read/write.
	Io(io::Error),

	/// State Store decode failure, `pages`/`pathIndex` bijection violation,
	/// or a missing ancestor blob where one is required. Fatal; no partial
	/// write is attempted.
	Integrity { message: String },

	/// A previously tracked page is no longer reported by the remote.
	RemoteDeleted { id: String },

	/// Lock acquisition failed; carries the path of the held lock.
	LockHeld { path: String },

	/// Nested state-store error.
	State(StateError),

	/// Nested merge-engine error.
	Merge(MergeError),

	/// Nested remote-collaborator error.
	Remote(RemoteError),
}

impl fmt::Display for SyncError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncError::Usage { message } => write!(f, "usage error: {}", message),
			SyncError::Auth { message } => write!(f, "authentication failed: {}", message),
			SyncError::Network { message } => write!(f, "network error: {}", message),
			SyncError::Io(e) => write!(f, "I/O error: {}", e),
			SyncError::Integrity { message } => write!(f, "integrity error: {}", message),
			SyncError::RemoteDeleted { id } => {
				write!(f, "page {} is no longer reported by the remote", id)
			}
			SyncError::LockHeld { path } => {
				write!(f, "sync already in progress (lock file at {})", path)
			}
			SyncError::State(e) => write!(f, "state error: {}", e),
			SyncError::Merge(e) => write!(f, "merge error: {}", e),
			SyncError::Remote(e) => write!(f, "remote error: {}", e),
		}
	}
}

impl Error for SyncError {}

impl From<io::Error> for SyncError {
	fn from(e: io::Error) -> Self {
		SyncError::Io(e)
	}
}

impl From<StateError> for SyncError {
	fn from(e: StateError) -> Self {
		SyncError::State(e)
	}
}

impl From<MergeError> for SyncError {
	fn from(e: MergeError) -> Self {
		SyncError::Merge(e)
	}
}

impl From<RemoteError> for SyncError {
	fn from(e: RemoteError) -> Self {
		SyncError::Remote(e)
	}
}

/// State Store specific errors.
#[derive(Debug)]
pub enum StateError {
	/// No `.atlcli/` directory found where one was required.
	NotInitialized { path: String },

	/// `.atlcli/` already exists; `init` refuses to clobber it.
	AlreadyInitialized { path: String },

	/// Persistent state's schema version is not one this build understands.
	SchemaMismatch { found: u32, expected: u32 },

	/// `state.json`/`config.json` failed to decode.
	Corrupt { message: String },

	/// A patch would have broken the `pages ↔ pathIndex` bijection.
	BijectionViolation { path: String, id: String },

	/// Underlying I/O failure while reading or writing state.
	Io(io::Error),
}

impl fmt::Display for StateError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StateError::NotInitialized { path } => {
				write!(f, "{} is not a tracked directory (no .atlcli/ found)", path)
			}
			StateError::AlreadyInitialized { path } => {
				write!(f, "{} is already initialized", path)
			}
			StateError::SchemaMismatch { found, expected } => {
				write!(f, "unknown schema version {} (expected {})", found, expected)
			}
			StateError::Corrupt { message } => write!(f, "corrupt state: {}", message),
			StateError::BijectionViolation { path, id } => {
				write!(f, "patch would break path/id bijection for {} <-> {}", path, id)
			}
			StateError::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl Error for StateError {}

impl From<io::Error> for StateError {
	fn from(e: io::Error) -> Self {
		StateError::Io(e)
	}
}

/// Merge engine errors (distinct from the `Conflicted` result, which is not
/// an error).
#[derive(Debug)]
pub enum MergeError {
	/// One of the three inputs could not be split into lines (never expected
	/// in practice since texts are always valid UTF-8 strings).
	InvalidInput { message: String },
}

impl fmt::Display for MergeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MergeError::InvalidInput { message } => write!(f, "invalid merge input: {}", message),
		}
	}
}

impl Error for MergeError {}

/// Errors surfaced by the `RemoteStore` collaborator.
#[derive(Debug)]
pub enum RemoteError {
	/// The remote rejected credentials.
	Auth { message: String },

	/// Remote unreachable, timed out, or returned a server error.
	Transient { message: String },

	/// Requested page id does not exist on the remote.
	NotFound { id: String },

	/// Optimistic-concurrency rejection: caller's version is stale.
	VersionConflict { id: String, expected: u64 },
}

impl fmt::Display for RemoteError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RemoteError::Auth { message } => write!(f, "authentication failed: {}", message),
			RemoteError::Transient { message } => write!(f, "transient remote error: {}", message),
			RemoteError::NotFound { id } => write!(f, "no such page: {}", id),
			RemoteError::VersionConflict { id, expected } => {
				write!(f, "version conflict on {}: expected {}", id, expected)
			}
		}
	}
}

impl Error for RemoteError {}

// vim: ts=4
