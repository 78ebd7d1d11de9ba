//! Journal sub-collection: ordered sequence of entries (spec §3, §9).
//!
//! Each element is one JSON-encoded [`Entry`], pushed and replaced as a
//! whole value (see `DESIGN.md` for why this crate favors JSON blobs over a
//! nested `MapRef`-per-entry composition).

use journal_types::{sort_canonical, Entry, EntryId, JournalError, JournalResult, Seq, Timestamp};
use serde_json::Value;
use yrs::{Array, ReadTxn, Transact};

use crate::document::JournalDocument;
use crate::merge::shallow_merge;
use crate::subcollection::{ChangeOrigin, SubCollection};

impl JournalDocument {
	/// All entries, in canonical order (spec §9).
	pub fn journal_list(&self) -> Vec<Entry> {
		let txn = self.doc.transact();
		let mut entries: Vec<Entry> = self
			.journal
			.iter(&txn)
			.filter_map(|v| v.cast::<String>().ok())
			.filter_map(|raw| serde_json::from_str::<Entry>(&raw).ok())
			.collect();
		sort_canonical(&mut entries);
		entries
	}

	/// A single entry by id, or `None` if absent.
	pub fn journal_get(&self, id: &EntryId) -> Option<Entry> {
		self.journal_list().into_iter().find(|e| &e.id == id)
	}

	/// Append a new entry, assigning it the next per-replica `seq` (spec §3).
	pub fn journal_append(&self, id: impl Into<EntryId>, content: impl Into<String>) -> JournalResult<Entry> {
		let id = id.into();
		if self.journal_get(&id).is_some() {
			return Err(JournalError::ParseError(format!("duplicate entry id: {}", id.as_str())));
		}
		let entry = Entry::new(id, content, Timestamp::now()).with_seq(Seq(self.next_seq()));
		let encoded = serde_json::to_string(&entry)
			.map_err(|e| JournalError::ParseError(format!("encode entry: {e}")))?;
		{
			let mut txn = self.doc.transact_mut();
			self.journal.push_back(&mut txn, encoded.as_str());
		}
		self.notify(SubCollection::Journal, ChangeOrigin::Local);
		Ok(entry)
	}

	/// Shallow-merge `patch` into the entry's JSON representation and
	/// replace it in place (spec §4.1 `update(id, patch)`).
	pub fn journal_update(&self, id: &EntryId, patch: &Value) -> JournalResult<()> {
		let index = self.journal_index_of(id)?;
		let mut current = {
			let txn = self.doc.transact();
			let raw = self
				.journal
				.get(&txn, index)
				.and_then(|v| v.cast::<String>().ok())
				.ok_or_else(|| JournalError::ParseError(format!("missing entry at index {index}")))?;
			serde_json::from_str::<Value>(&raw)
				.map_err(|e| JournalError::ParseError(format!("decode entry: {e}")))?
		};
		shallow_merge(&mut current, patch)
			.map_err(|e| JournalError::ParseError(format!("merge entry patch: {e}")))?;
		let encoded = serde_json::to_string(&current)
			.map_err(|e| JournalError::ParseError(format!("encode entry: {e}")))?;
		{
			let mut txn = self.doc.transact_mut();
			self.journal.remove(&mut txn, index);
			self.journal.insert(&mut txn, index, encoded.as_str());
		}
		self.notify(SubCollection::Journal, ChangeOrigin::Local);
		Ok(())
	}

	/// Remove an entry by id.
	pub fn journal_delete(&self, id: &EntryId) -> JournalResult<()> {
		let index = self.journal_index_of(id)?;
		{
			let mut txn = self.doc.transact_mut();
			self.journal.remove(&mut txn, index);
		}
		self.notify(SubCollection::Journal, ChangeOrigin::Local);
		Ok(())
	}

	fn journal_index_of(&self, id: &EntryId) -> JournalResult<u32> {
		let txn = self.doc.transact();
		self.journal
			.iter(&txn)
			.enumerate()
			.filter_map(|(i, v)| v.cast::<String>().ok().map(|raw| (i, raw)))
			.find_map(|(i, raw)| {
				serde_json::from_str::<Entry>(&raw).ok().filter(|e| &e.id == id).map(|_| i as u32)
			})
			.ok_or_else(|| JournalError::ParseError(format!("no such entry: {}", id.as_str())))
	}
}


// vim: ts=4
