//! Character sub-collection (spec §3: "mapping from field name ... to string").

use journal_types::JournalResult;
use yrs::{Map, ReadTxn, Transact};

use crate::document::JournalDocument;
use crate::subcollection::{ChangeOrigin, SubCollection};

/// Recognized character fields (spec §3, §4.6).
pub const CHARACTER_FIELDS: &[&str] = &["name", "race", "class", "backstory", "notes"];

impl JournalDocument {
	/// Read a character field. Returns `None` if never set.
	pub fn character_get(&self, field: &str) -> Option<String> {
		let txn = self.doc.transact();
		self.character.get(&txn, field).and_then(|v| v.cast::<String>().ok())
	}

	/// Read all recognized character fields as a map, substituting `""` for
	/// unset fields.
	pub fn character_all(&self) -> std::collections::BTreeMap<String, String> {
		let txn = self.doc.transact();
		CHARACTER_FIELDS
			.iter()
			.map(|field| {
				let value =
					self.character.get(&txn, field).and_then(|v| v.cast::<String>().ok()).unwrap_or_default();
				((*field).to_string(), value)
			})
			.collect()
	}

	/// Set a character field (spec §3: "mutated by the character page").
	pub fn character_set(&self, field: &str, value: &str) -> JournalResult<()> {
		{
			let mut txn = self.doc.transact_mut();
			self.character.insert(&mut txn, field, value);
		}
		self.notify(SubCollection::Character, ChangeOrigin::Local);
		Ok(())
	}
}


// vim: ts=4
