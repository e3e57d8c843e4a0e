//! Configuration for the sync engine: daemon timing, webhook binding, and
//! the conflict policy. Per-directory remote binding (`spaceKey`, `baseUrl`,
//! `profile`) lives in `DirectoryConfig` (see `types.rs`) since it's part of
//! the persistent `.atlcli/config.json`, not a runtime knob.

use serde::{Deserialize, Serialize};

use crate::types::OnConflict;

/// Runtime configuration for `sync` (the daemon loop). Not persisted;
/// supplied per-invocation (by CLI flags or a caller's `SyncOptions`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// Debounce window for the filesystem watcher, in milliseconds.
	pub debounce_window_ms: u64,

	/// Poller interval, in seconds.
	pub poll_interval_secs: u64,

	/// Port for the embedded webhook HTTP listener. `None` disables it.
	pub webhook_port: Option<u16>,

	/// Conflict resolution policy.
	#[serde(with = "on_conflict_serde")]
	pub on_conflict: OnConflict,

	/// If set, all writes (disk, State Store, RemoteStore) are skipped; the
	/// engine only reports the actions it would have performed.
	pub dry_run: bool,

	/// Remote operation timeout, in seconds.
	pub remote_timeout_secs: u64,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			debounce_window_ms: 500,
			poll_interval_secs: 30,
			webhook_port: None,
			on_conflict: OnConflict::Merge,
			dry_run: false,
			remote_timeout_secs: 30,
		}
	}
}

mod on_conflict_serde {
	use super::OnConflict;
	use serde::{Deserialize, Deserializer, Serializer};
	use std::str::FromStr;

	pub fn serialize<S: Serializer>(value: &OnConflict, s: S) -> Result<S::Ok, S::Error> {
		let text = match value {
			OnConflict::Merge => "merge",
			OnConflict::Local => "local",
			OnConflict::Remote => "remote",
			OnConflict::Prompt => "prompt",
		};
		s.serialize_str(text)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<OnConflict, D::Error> {
		let text = String::deserialize(d)?;
		OnConflict::from_str(&text).map_err(serde::de::Error::custom)
	}
}


// vim: ts=4
