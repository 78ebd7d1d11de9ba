//! Questions Cache sub-collection (spec §3, §4.8): storage for C8's
//! reflective-question outputs. Generation policy lives in the pipeline
//! crate; this module only persists and reads records.

use journal_types::{Fingerprint, JournalError, JournalResult};
use serde::{Deserialize, Serialize};
use yrs::{Map, ReadTxn, Transact};

use crate::document::JournalDocument;
use crate::subcollection::{ChangeOrigin, SubCollection};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuestionsRecord {
	pub questions: String,
	pub timestamp: i64,
}

impl JournalDocument {
	pub fn questions_get(&self, fingerprint: &Fingerprint) -> Option<QuestionsRecord> {
		let txn = self.doc.transact();
		self.questions_cache
			.get(&txn, fingerprint.as_str())
			.and_then(|v| v.cast::<String>().ok())
			.and_then(|raw| serde_json::from_str(&raw).ok())
	}

	pub fn questions_set(&self, fingerprint: &Fingerprint, record: &QuestionsRecord) -> JournalResult<()> {
		let encoded = serde_json::to_string(record)
			.map_err(|e| JournalError::ParseError(format!("encode questions record: {e}")))?;
		{
			let mut txn = self.doc.transact_mut();
			self.questions_cache.insert(&mut txn, fingerprint.as_str(), encoded.as_str());
		}
		self.notify(SubCollection::QuestionsCache, ChangeOrigin::Local);
		Ok(())
	}
}


// vim: ts=4
