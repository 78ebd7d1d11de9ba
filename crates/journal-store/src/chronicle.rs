//! Chronicle sub-collection (spec §3, §4.7, C7): the hierarchical
//! summarization state the Parts Engine maintains over the Journal.

use std::collections::BTreeMap;

use journal_types::{EntryId, JournalError, JournalResult};
use serde::{Deserialize, Serialize};
use yrs::{Map, ReadTxn, Transact};

use crate::document::JournalDocument;
use crate::subcollection::{ChangeOrigin, SubCollection};

const KEY_LATEST_PART_INDEX: &str = "latest-part-index";
const KEY_SO_FAR_SUMMARY: &str = "so-far-summary";
const KEY_RECENT_SUMMARY: &str = "recent-summary";
const KEY_PARTS: &str = "parts";

/// One closed partition of the Journal (spec §3: "Part").
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
	pub title: String,
	pub summary: String,
	pub entries: Vec<EntryId>,
}

impl JournalDocument {
	fn chronicle_get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
		let txn = self.doc.transact();
		self.chronicle.get(&txn, key).and_then(|v| v.cast::<String>().ok()).and_then(|raw| serde_json::from_str(&raw).ok())
	}

	fn chronicle_set_json<T: Serialize>(&self, key: &str, value: &T) -> JournalResult<()> {
		let encoded = serde_json::to_string(value)
			.map_err(|e| JournalError::ParseError(format!("encode chronicle.{key}: {e}")))?;
		{
			let mut txn = self.doc.transact_mut();
			self.chronicle.insert(&mut txn, key, encoded.as_str());
		}
		self.notify(SubCollection::Chronicle, ChangeOrigin::Local);
		Ok(())
	}

	/// Highest index `i` such that part `i` is closed; `0` means no part has
	/// been closed yet (spec §4.7 invariant: "`latestPartIndex ≥ 0`").
	pub fn chronicle_latest_part_index(&self) -> u32 {
		self.chronicle_get_json(KEY_LATEST_PART_INDEX).unwrap_or(0)
	}

	pub fn chronicle_set_latest_part_index(&self, index: u32) -> JournalResult<()> {
		self.chronicle_set_json(KEY_LATEST_PART_INDEX, &index)
	}

	/// Cumulative summary over all closed parts (spec §4.7).
	pub fn chronicle_so_far_summary(&self) -> String {
		self.chronicle_get_json(KEY_SO_FAR_SUMMARY).unwrap_or_default()
	}

	pub fn chronicle_set_so_far_summary(&self, summary: &str) -> JournalResult<()> {
		self.chronicle_set_json(KEY_SO_FAR_SUMMARY, &summary)
	}

	/// Summary over the still-open tail of the Journal (spec §4.7).
	pub fn chronicle_recent_summary(&self) -> String {
		self.chronicle_get_json(KEY_RECENT_SUMMARY).unwrap_or_default()
	}

	pub fn chronicle_set_recent_summary(&self, summary: &str) -> JournalResult<()> {
		self.chronicle_set_json(KEY_RECENT_SUMMARY, &summary)
	}

	fn chronicle_parts_raw(&self) -> BTreeMap<u32, Part> {
		self.chronicle_get_json::<BTreeMap<String, Part>>(KEY_PARTS)
			.unwrap_or_default()
			.into_iter()
			.filter_map(|(k, v)| k.parse::<u32>().ok().map(|i| (i, v)))
			.collect()
	}

	/// All closed parts, ordered by index (spec §4.7 invariant: "union of
	/// all closed parts is a prefix of the Journal").
	pub fn chronicle_parts(&self) -> BTreeMap<u32, Part> {
		self.chronicle_parts_raw()
	}

	pub fn chronicle_get_part(&self, index: u32) -> Option<Part> {
		self.chronicle_parts_raw().remove(&index)
	}

	pub fn chronicle_set_part(&self, index: u32, part: Part) -> JournalResult<()> {
		let mut parts: BTreeMap<String, Part> =
			self.chronicle_parts_raw().into_iter().map(|(i, p)| (i.to_string(), p)).collect();
		parts.insert(index.to_string(), part);
		self.chronicle_set_json(KEY_PARTS, &parts)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_empty() {
		let doc = JournalDocument::new();
		assert_eq!(doc.chronicle_latest_part_index(), 0);
		assert_eq!(doc.chronicle_so_far_summary(), "");
		assert!(doc.chronicle_parts().is_empty());
	}

	#[test]
	fn set_part_then_read_back() {
		let doc = JournalDocument::new();
		let part = Part { title: "The Sunken Keep".to_string(), summary: "...".to_string(), entries: vec![EntryId::new("e1"), EntryId::new("e2")] };
		doc.chronicle_set_part(1, part.clone()).unwrap();
		doc.chronicle_set_latest_part_index(1).unwrap();
		assert_eq!(doc.chronicle_get_part(1), Some(part));
		assert_eq!(doc.chronicle_latest_part_index(), 1);
	}

	#[test]
	fn setting_one_part_does_not_clobber_another() {
		let doc = JournalDocument::new();
		doc.chronicle_set_part(1, Part { title: "A".to_string(), ..Default::default() }).unwrap();
		doc.chronicle_set_part(2, Part { title: "B".to_string(), ..Default::default() }).unwrap();
		assert_eq!(doc.chronicle_parts().len(), 2);
		assert_eq!(doc.chronicle_get_part(1).unwrap().title, "A");
	}
}

// vim: ts=4
