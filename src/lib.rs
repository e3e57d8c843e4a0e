//! # atlcli-sync - Directory-to-wiki reconciliation engine
//!
//! Keeps a local directory of Markdown files and a remote wiki space in
//! sync: two-way, by content fingerprint, with a three-way merge engine for
//! concurrent edits.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use atlcli_sync::reconcile::ReconciliationEngine;
//! use atlcli_sync::remote::MockRemoteStore;
//! use atlcli_sync::format_codec::MarkdownStorageCodec;
//! use atlcli_sync::config::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let remote = Arc::new(MockRemoteStore::new());
//!     let engine = ReconciliationEngine::new("./docs", remote, Arc::new(MarkdownStorageCodec), Config::default());
//!     engine.init("DOCS", "https://example.atlassian.net/wiki", "default").await?;
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(dead_code)]

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod format_codec;
pub mod frontmatter;
pub mod logging;
pub mod merge;
pub mod reconcile;
pub mod remote;
pub mod state;
pub mod types;
pub mod utils;

pub use config::Config;
pub use error::{MergeError, RemoteError, StateError, SyncError};
pub use reconcile::{Action, ReconciliationEngine, StatusReport};
pub use types::{Accept, DirectoryConfig, DirectoryState, OnConflict, PageId, PageState, Scope, SyncState};

// vim: ts=4
