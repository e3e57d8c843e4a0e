//! Embedded webhook receiver producer task.
//!
//! Accepts POST payloads describing `page_created`/`page_updated`/
//! `page_removed`/`page_trashed`; payloads outside the configured scope
//! filter are ignored, the rest become immediate remote-change events.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::events::Event;
use crate::types::PageId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload {
	id: PageId,
	#[allow(dead_code)]
	title: String,
	space_key: String,
}

/// Which pages/spaces the webhook receiver accepts events for.
#[derive(Debug, Clone, Default)]
pub struct WebhookScopeFilter {
	pub page_ids: Option<BTreeSet<PageId>>,
	pub space_key: Option<String>,
}

impl WebhookScopeFilter {
	fn accepts(&self, payload: &WebhookPayload) -> bool {
		if let Some(ids) = &self.page_ids {
			if !ids.contains(&payload.id) {
				return false;
			}
		}
		if let Some(space) = &self.space_key {
			if space != &payload.space_key {
				return false;
			}
		}
		true
	}
}

#[derive(Clone)]
struct WebhookState {
	filter: WebhookScopeFilter,
	tx: mpsc::Sender<Event>,
}

async fn handle_event(State(state): State<WebhookState>, Json(payload): Json<WebhookPayload>) -> &'static str {
	if !state.filter.accepts(&payload) {
		return "ignored";
	}
	if state.tx.send(Event::Remote { id: payload.id, observed_version: None }).await.is_err() {
		warn!("webhook: reconciliation queue closed, dropping event");
	}
	"accepted"
}

/// Spawn the embedded HTTP listener on `port`. Returns a handle the caller
/// can abort on shutdown.
pub fn spawn(port: u16, filter: WebhookScopeFilter, tx: mpsc::Sender<Event>) -> tokio::task::JoinHandle<()> {
	tokio::spawn(async move {
		let state = WebhookState { filter, tx };
		let app = Router::new()
			.route("/webhook/page_created", post(handle_event))
			.route("/webhook/page_updated", post(handle_event))
			.route("/webhook/page_removed", post(handle_event))
			.route("/webhook/page_trashed", post(handle_event))
			.with_state(state);

		let addr = SocketAddr::from(([0, 0, 0, 0], port));
		let listener = match tokio::net::TcpListener::bind(addr).await {
			Ok(listener) => listener,
			Err(e) => {
				warn!("webhook receiver failed to bind {}: {}", addr, e);
				return;
			}
		};
		info!("webhook receiver listening on {}", addr);
		if let Err(e) = axum::serve(listener, app).await {
			warn!("webhook receiver stopped: {}", e);
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn payload(id: &str, space: &str) -> WebhookPayload {
		WebhookPayload { id: id.to_string(), title: "t".to_string(), space_key: space.to_string() }
	}

	#[test]
	fn empty_filter_accepts_everything() {
		let filter = WebhookScopeFilter::default();
		assert!(filter.accepts(&payload("P1", "SPC")));
	}

	#[test]
	fn page_id_filter_rejects_other_pages() {
		let filter = WebhookScopeFilter {
			page_ids: Some(BTreeSet::from(["P1".to_string()])),
			space_key: None,
		};
		assert!(filter.accepts(&payload("P1", "SPC")));
		assert!(!filter.accepts(&payload("P2", "SPC")));
	}

	#[test]
	fn space_filter_rejects_other_spaces() {
		let filter = WebhookScopeFilter { page_ids: None, space_key: Some("SPC".to_string()) };
		assert!(filter.accepts(&payload("P1", "SPC")));
		assert!(!filter.accepts(&payload("P1", "OTHER")));
	}
}

// vim: ts=4
