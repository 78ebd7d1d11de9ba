//! Settings Projection (spec §4.3, C3): typed view over the settings
//! sub-collection.

use journal_types::JournalResult;
use yrs::{Map, ReadTxn, Transact};

use crate::document::JournalDocument;
use crate::subcollection::{ChangeOrigin, SubCollection};

const KEY_OPENAI_API_KEY: &str = "openai-api-key";
const KEY_AI_ENABLED: &str = "ai-enabled";
const KEY_SYNC_SERVER_URL: &str = "sync-server-url";
const KEY_LATEST_ANCHOR_SEQ: &str = "latest-anchor-seq";

impl JournalDocument {
	fn settings_get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
		let txn = self.doc.transact();
		self.settings.get(&txn, key).and_then(|v| v.cast::<String>().ok()).and_then(|raw| serde_json::from_str(&raw).ok())
	}

	fn settings_set_json<T: serde::Serialize>(&self, key: &str, value: &T) -> JournalResult<()> {
		let encoded = serde_json::to_string(value)
			.map_err(|e| journal_types::JournalError::ParseError(format!("encode setting {key}: {e}")))?;
		{
			let mut txn = self.doc.transact_mut();
			self.settings.insert(&mut txn, key, encoded.as_str());
		}
		self.notify(SubCollection::Settings, ChangeOrigin::Local);
		Ok(())
	}

	/// Default `false` (spec §4.3).
	pub fn ai_enabled(&self) -> bool {
		self.settings_get_json(KEY_AI_ENABLED).unwrap_or(false)
	}

	pub fn set_ai_enabled(&self, value: bool) -> JournalResult<()> {
		self.settings_set_json(KEY_AI_ENABLED, &value)
	}

	/// Default `""` (spec §4.3).
	pub fn openai_api_key(&self) -> String {
		self.settings_get_json(KEY_OPENAI_API_KEY).unwrap_or_default()
	}

	pub fn set_openai_api_key(&self, value: &str) -> JournalResult<()> {
		self.settings_set_json(KEY_OPENAI_API_KEY, &value)
	}

	/// Default `""`. Writing this key MUST cause C2 to reconnect; that is
	/// the Event Orchestrator's responsibility when it observes `Settings`
	/// changes, not this projection's (spec §4.3, §4.9).
	pub fn sync_server_url(&self) -> String {
		self.settings_get_json(KEY_SYNC_SERVER_URL).unwrap_or_default()
	}

	pub fn set_sync_server_url(&self, value: &str) -> JournalResult<()> {
		self.settings_set_json(KEY_SYNC_SERVER_URL, &value)
	}

	/// Default `0` (spec §4.3, consulted by the anchor mechanism, spec §4.7).
	pub fn latest_anchor_seq(&self) -> u64 {
		self.settings_get_json(KEY_LATEST_ANCHOR_SEQ).unwrap_or(0)
	}

	pub fn set_latest_anchor_seq(&self, value: u64) -> JournalResult<()> {
		self.settings_set_json(KEY_LATEST_ANCHOR_SEQ, &value)
	}
}


// vim: ts=4
