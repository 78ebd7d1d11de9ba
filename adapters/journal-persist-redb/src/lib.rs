//! redb-backed [`PersistAdapter`] (spec §4.2, C2).
//!
//! A single document per process needs no tenant dimension and no
//! per-document instance cache, so this crate keeps one `redb::Database`,
//! one update-sequence table, and one metadata row.
//!
//! # Storage layout
//!
//! - `updates`: `u64` sequence number → update bytes, in insertion order
//!   (native integer keys sort correctly; a string-prefixed key scheme built
//!   for multi-tenant range scans isn't needed here — see `DESIGN.md`).
//! - `meta`: a single row keyed `"doc"` holding [`DocMeta`] as JSON.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures_core::Stream;
use journal_persist::{DocMeta, PersistAdapter, StoredUpdate};
use journal_types::{JournalError, JournalResult};
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, trace};

const TABLE_UPDATES: TableDefinition<u64, &[u8]> = TableDefinition::new("updates");
const TABLE_META: TableDefinition<&str, &str> = TableDefinition::new("meta");
const META_KEY: &str = "doc";
const BROADCAST_CAPACITY: usize = 1000;

fn db_error(context: &str, err: impl std::fmt::Display) -> JournalError {
	JournalError::PersistenceUnavailable(format!("{context}: {err}"))
}

/// redb-backed local durable store for the single replicated document.
pub struct RedbPersistAdapter {
	db: RwLock<redb::Database>,
	next_seq: AtomicU64,
	broadcaster: broadcast::Sender<StoredUpdate>,
}

impl RedbPersistAdapter {
	/// Open (or create) the database file at `path`, creating both tables.
	pub async fn open(path: impl AsRef<Path>) -> JournalResult<Self> {
		let path: PathBuf = path.as_ref().to_path_buf();
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent).map_err(|e| db_error("create storage directory", e))?;
		}

		debug!("opening journal store at {:?}", path);
		let db = redb::Database::create(&path).map_err(|e| db_error("open database", e))?;

		{
			let tx = db.begin_write().map_err(|e| db_error("begin write transaction", e))?;
			let _ = tx.open_table(TABLE_UPDATES);
			let _ = tx.open_table(TABLE_META);
			tx.commit().map_err(|e| db_error("commit table creation", e))?;
		}

		let next_seq = {
			let tx = db.begin_read().map_err(|e| db_error("begin read transaction", e))?;
			let table = tx.open_table(TABLE_UPDATES).map_err(|e| db_error("open updates table", e))?;
			let mut highest = None;
			for item in table.iter().map_err(|e| db_error("iterate updates", e))? {
				let (key, _) = item.map_err(|e| db_error("read update key", e))?;
				highest = Some(key.value());
			}
			highest.map(|k| k + 1).unwrap_or(0)
		};

		let (broadcaster, _) = broadcast::channel(BROADCAST_CAPACITY);
		Ok(Self { db: RwLock::new(db), next_seq: AtomicU64::new(next_seq), broadcaster })
	}
}

#[async_trait]
impl PersistAdapter for RedbPersistAdapter {
	async fn get_updates(&self) -> JournalResult<Vec<StoredUpdate>> {
		let db = self.db.read().await;
		let tx = db.begin_read().map_err(|e| db_error("begin read transaction", e))?;
		let table = tx.open_table(TABLE_UPDATES).map_err(|e| db_error("open updates table", e))?;

		let mut updates = Vec::new();
		for item in table.iter().map_err(|e| db_error("iterate updates", e))? {
			let (_, value) = item.map_err(|e| db_error("read update", e))?;
			updates.push(StoredUpdate::new(value.value().to_vec()));
		}
		trace!("loaded {} stored updates", updates.len());
		Ok(updates)
	}

	async fn store_update(&self, update: StoredUpdate) -> JournalResult<()> {
		let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);

		{
			let db = self.db.read().await;
			let tx = db.begin_write().map_err(|e| db_error("begin write transaction", e))?;
			{
				let mut table = tx.open_table(TABLE_UPDATES).map_err(|e| db_error("open updates table", e))?;
				table.insert(seq, update.data.as_slice()).map_err(|e| db_error("insert update", e))?;
			}
			tx.commit().map_err(|e| db_error("commit update", e))?;
		}

		let _ = self.broadcaster.send(update);
		Ok(())
	}

	async fn get_meta(&self) -> JournalResult<DocMeta> {
		let db = self.db.read().await;
		let tx = db.begin_read().map_err(|e| db_error("begin read transaction", e))?;
		let table = tx.open_table(TABLE_META).map_err(|e| db_error("open meta table", e))?;

		match table.get(META_KEY).map_err(|e| db_error("read meta", e))? {
			Some(value) => serde_json::from_str(value.value()).map_err(|e| db_error("decode meta", e)),
			None => Ok(DocMeta::default()),
		}
	}

	async fn set_meta(&self, meta: DocMeta) -> JournalResult<()> {
		let encoded = serde_json::to_string(&meta).map_err(|e| db_error("encode meta", e))?;
		let db = self.db.read().await;
		let tx = db.begin_write().map_err(|e| db_error("begin write transaction", e))?;
		{
			let mut table = tx.open_table(TABLE_META).map_err(|e| db_error("open meta table", e))?;
			table.insert(META_KEY, encoded.as_str()).map_err(|e| db_error("insert meta", e))?;
		}
		tx.commit().map_err(|e| db_error("commit meta", e))?;
		Ok(())
	}

	async fn subscribe(&self) -> JournalResult<Pin<Box<dyn Stream<Item = StoredUpdate> + Send>>> {
		let existing = self.get_updates().await?;
		let mut rx = self.broadcaster.subscribe();

		let stream = async_stream::stream! {
			for update in existing {
				yield update;
			}
			while let Ok(update) = rx.recv().await {
				yield update;
			}
		};
		Ok(Box::pin(stream))
	}

	async fn delete(&self) -> JournalResult<()> {
		let db = self.db.read().await;
		let tx = db.begin_write().map_err(|e| db_error("begin write transaction", e))?;
		{
			let mut updates = tx.open_table(TABLE_UPDATES).map_err(|e| db_error("open updates table", e))?;
			let keys: Vec<u64> = {
				let range = updates.iter().map_err(|e| db_error("iterate updates", e))?;
				let mut keys = Vec::new();
				for item in range {
					let (key, _) = item.map_err(|e| db_error("read update key", e))?;
					keys.push(key.value());
				}
				keys
			};
			for key in keys {
				updates.remove(key).map_err(|e| db_error("delete update", e))?;
			}
			let mut meta = tx.open_table(TABLE_META).map_err(|e| db_error("open meta table", e))?;
			meta.remove(META_KEY).map_err(|e| db_error("remove meta", e))?;
		}
		tx.commit().map_err(|e| db_error("commit deletion", e))?;
		self.next_seq.store(0, Ordering::SeqCst);
		Ok(())
	}
}

impl std::fmt::Debug for RedbPersistAdapter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RedbPersistAdapter").finish_non_exhaustive()
	}
}

// vim: ts=4
