//! Summary Cache (spec §4.4, C4): fingerprint-keyed LLM output cache with
//! at-most-one-in-flight dedup via `acquireBuild`.

use dashmap::mapref::entry::Entry as DashEntry;
use journal_types::{Fingerprint, JournalError, JournalResult};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use yrs::{Map, ReadTxn, Transact};

use crate::document::{JournalDocument, SUMMARY_RECORD_CHANNEL_CAPACITY};
use crate::subcollection::{ChangeOrigin, SubCollection};

/// The cached payload for a fingerprint (spec §3: "SummaryRecord").
///
/// `content` is either a plain rollup string or, for per-entry structured
/// summaries, the `{title, subtitle, summary}` shape spec §4.4 names.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SummaryContent {
	Plain(String),
	Structured { title: String, subtitle: String, summary: String },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
	pub content: SummaryContent,
	pub words: u32,
	pub original_words: u32,
	pub timestamp: i64,
}

/// Returned by [`JournalDocument::acquire_build`].
pub enum BuildOutcome {
	/// No build is in flight; the caller must run it and release the
	/// ticket via [`BuildTicket::complete`] or [`BuildTicket::fail`].
	Owner(BuildTicket),
	/// Another caller already owns the build; await [`PendingBuild::wait`]
	/// for its result instead of calling the provider again.
	Pending(PendingBuild),
}

pub struct BuildTicket {
	fingerprint: Fingerprint,
	tx: broadcast::Sender<Option<SummaryRecord>>,
}

impl BuildTicket {
	/// Persist the built record and release the ticket, waking any callers
	/// coalesced behind this build.
	pub fn complete(self, doc: &JournalDocument, record: SummaryRecord) -> JournalResult<()> {
		doc.summary_set(&self.fingerprint, &record)?;
		doc.pending_builds.remove(&self.fingerprint);
		let _ = self.tx.send(Some(record));
		Ok(())
	}

	/// Release the ticket without writing a record (spec §4.4: "tickets
	/// MUST be released on completion or failure").
	pub fn fail(self, doc: &JournalDocument) {
		doc.pending_builds.remove(&self.fingerprint);
		let _ = self.tx.send(None);
	}
}

pub struct PendingBuild {
	rx: broadcast::Receiver<Option<SummaryRecord>>,
}

impl PendingBuild {
	/// Wait for the owning build to finish. `None` means the owner's build
	/// failed or the channel was dropped without completing.
	pub async fn wait(mut self) -> Option<SummaryRecord> {
		self.rx.recv().await.ok().flatten()
	}
}

impl JournalDocument {
	pub fn summary_get(&self, fingerprint: &Fingerprint) -> Option<SummaryRecord> {
		let txn = self.doc.transact();
		self.summaries
			.get(&txn, fingerprint.as_str())
			.and_then(|v| v.cast::<String>().ok())
			.and_then(|raw| serde_json::from_str(&raw).ok())
	}

	/// `exists(fp)` (spec §4.4 "Operations"): whether a record is present,
	/// without deserializing it.
	pub fn summary_exists(&self, fingerprint: &Fingerprint) -> bool {
		let txn = self.doc.transact();
		self.summaries.get(&txn, fingerprint.as_str()).is_some()
	}

	pub fn summary_set(&self, fingerprint: &Fingerprint, record: &SummaryRecord) -> JournalResult<()> {
		let encoded = serde_json::to_string(record)
			.map_err(|e| JournalError::ParseError(format!("encode summary record: {e}")))?;
		{
			let mut txn = self.doc.transact_mut();
			self.summaries.insert(&mut txn, fingerprint.as_str(), encoded.as_str());
		}
		self.notify(SubCollection::Summaries, ChangeOrigin::Local);
		Ok(())
	}

	/// Invalidate a stale record (spec §9: "character field content
	/// changed" invalidation). `clear(fp)` in spec §4.4 "Operations".
	pub fn summary_invalidate(&self, fingerprint: &Fingerprint) -> JournalResult<()> {
		{
			let mut txn = self.doc.transact_mut();
			self.summaries.remove(&mut txn, fingerprint.as_str());
		}
		self.notify(SubCollection::Summaries, ChangeOrigin::Local);
		Ok(())
	}

	/// `clearAll()` (spec §4.4 "Operations"): drop every cached record at
	/// once, e.g. to force a full re-summarization.
	pub fn summary_clear_all(&self) -> JournalResult<()> {
		{
			let mut txn = self.doc.transact_mut();
			self.summaries.clear(&mut txn);
		}
		self.notify(SubCollection::Summaries, ChangeOrigin::Local);
		Ok(())
	}

	/// Coalesce concurrent build requests for the same fingerprint into one
	/// pending future (spec §4.4, §5 "Dedup across concurrent handlers").
	pub fn acquire_build(&self, fingerprint: &Fingerprint) -> BuildOutcome {
		match self.pending_builds.entry(fingerprint.clone()) {
			DashEntry::Occupied(occupied) => BuildOutcome::Pending(PendingBuild { rx: occupied.get().subscribe() }),
			DashEntry::Vacant(vacant) => {
				let (tx, _rx) = broadcast::channel(SUMMARY_RECORD_CHANNEL_CAPACITY);
				vacant.insert(tx.clone());
				BuildOutcome::Owner(BuildTicket { fingerprint: fingerprint.clone(), tx })
			}
		}
	}
}


// vim: ts=4
