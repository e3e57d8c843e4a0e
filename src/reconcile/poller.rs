//! Remote poller producer task.
//!
//! Every `poll_interval`, asks the `RemoteStore` for the current version of
//! every tracked page in scope; pages whose reported version exceeds their
//! recorded one become remote-change events.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::events::Event;
use crate::remote::RemoteStore;
use crate::state::StateStore;
use crate::types::Scope;

pub fn spawn(
	state_store: Arc<StateStore>,
	remote: Arc<dyn RemoteStore>,
	scope: Scope,
	interval: Duration,
	tx: mpsc::Sender<Event>,
) -> tokio::task::JoinHandle<()> {
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);
		loop {
			ticker.tick().await;

			let state = match state_store.read_state().await {
				Ok(state) => state,
				Err(e) => {
					warn!("poller: failed to read state: {}", e);
					continue;
				}
			};

			let entries = match remote.enumerate_scope(&scope).await {
				Ok(entries) => entries,
				Err(e) => {
					warn!("poller: enumerate_scope failed: {}", e);
					continue;
				}
			};

			for entry in entries {
				if let Some(page) = state.pages.get(&entry.id) {
					if entry.version > page.version {
						debug!("poller: {} advanced to version {}", entry.id, entry.version);
						if tx
							.send(Event::Remote { id: entry.id.clone(), observed_version: Some(entry.version) })
							.await
							.is_err()
						{
							return;
						}
					}
				}
			}
		}
	})
}

// vim: ts=4
