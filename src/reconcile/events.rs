//! The reconciliation event queue shared by the watcher, poller, and
//! webhook producer tasks.

use std::path::PathBuf;

use crate::types::PageId;

/// One reconciliation event. `Local` carries a path relative to the tracked
/// root; `Remote` carries a page id plus an optionally already-known
/// version/text (the webhook receiver has these on hand, the poller only
/// has the version).
#[derive(Debug, Clone)]
pub enum Event {
	Local { path: PathBuf },
	Remote { id: PageId, observed_version: Option<u64> },
}

/// Bounded channel shared by all three producers. Bounding it gives the
/// producers back-pressure instead of letting an event flood grow memory
/// unboundedly ahead of a slow consumer.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

pub fn channel() -> (tokio::sync::mpsc::Sender<Event>, tokio::sync::mpsc::Receiver<Event>) {
	tokio::sync::mpsc::channel(EVENT_CHANNEL_CAPACITY)
}

// vim: ts=4
