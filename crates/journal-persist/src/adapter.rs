//! `PersistAdapter`: pluggable local durable store for the journal document
//! (spec §4.2, C2).
//!
//! Shaped directly on a `CrdtAdapter`-style trait, simplified to a single
//! document per process: this crate has no tenant or multi-document
//! concept, so those parameters are dropped.

use std::fmt::Debug;
use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use journal_types::{JournalResult, Timestamp};
use serde::{Deserialize, Serialize};

/// A binary CRDT update (yrs sync protocol bytes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUpdate {
	pub data: Vec<u8>,
	pub timestamp: Timestamp,
	pub client_id: Option<Box<str>>,
}

impl StoredUpdate {
	pub fn new(data: Vec<u8>) -> Self {
		Self { data, timestamp: Timestamp::now(), client_id: None }
	}

	pub fn with_client(data: Vec<u8>, client_id: impl Into<Box<str>>) -> Self {
		Self { data, timestamp: Timestamp::now(), client_id: Some(client_id.into()) }
	}
}

/// Metadata tracked alongside the update log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
	#[serde(default)]
	pub initialized: bool,
	#[serde(default)]
	pub created_at: i64,
	#[serde(default)]
	pub updated_at: i64,
	#[serde(default)]
	pub size_bytes: u64,
	#[serde(default)]
	pub update_count: u32,
}

/// Aggregate statistics over the stored document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocStats {
	pub size_bytes: u64,
	pub update_count: u32,
	pub meta: DocMeta,
}

/// Local durable store binding for the single replicated document (spec
/// §4.2: "Persistence & Sync Adapter").
///
/// Adapters persist binary CRDT updates in arrival order; `get_updates()`
/// must return them in the order they were stored so a fresh `JournalDocument`
/// can reconstruct current state by applying them in sequence.
#[async_trait]
pub trait PersistAdapter: Debug + Send + Sync {
	/// All stored updates, in storage order. Empty if no document exists
	/// yet (safe to treat as a fresh replica, spec §4.2 "begin local
	/// hydration immediately").
	async fn get_updates(&self) -> JournalResult<Vec<StoredUpdate>>;

	/// Persist a new update. Implicitly creates the document on first call.
	async fn store_update(&self, update: StoredUpdate) -> JournalResult<()>;

	async fn get_meta(&self) -> JournalResult<DocMeta>;

	async fn set_meta(&self, meta: DocMeta) -> JournalResult<()>;

	/// Stream of updates appended after subscription starts.
	async fn subscribe(&self) -> JournalResult<Pin<Box<dyn Stream<Item = StoredUpdate> + Send>>>;

	/// Aggregate stats, derived from [`PersistAdapter::get_meta`] by default.
	async fn stats(&self) -> JournalResult<DocStats> {
		let meta = self.get_meta().await?;
		Ok(DocStats { size_bytes: meta.size_bytes, update_count: meta.update_count, meta })
	}

	/// Remove all stored data. Used only by tests and explicit resets.
	async fn delete(&self) -> JournalResult<()>;

	/// Flush and release any resources held open. No-op unless overridden.
	async fn close(&self) -> JournalResult<()> {
		Ok(())
	}
}

// vim: ts=4
