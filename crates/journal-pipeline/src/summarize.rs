//! Shared cache-or-build plumbing used by the Context Builder, Parts Engine
//! and Question Generator (spec §4.4 `acquireBuild`, reused across C6-C8).

use std::future::Future;

use journal_llm::LlmGateway;
use journal_store::{BuildOutcome, JournalDocument, SummaryContent, SummaryRecord};
use journal_types::{EntryId, Fingerprint, JournalError, JournalResult, Timestamp};

pub fn word_count(s: &str) -> usize {
	s.split_whitespace().count()
}

/// Displayable text for a cached record, regardless of variant.
pub fn plain_text(content: &SummaryContent) -> String {
	match content {
		SummaryContent::Plain(s) => s.clone(),
		SummaryContent::Structured { summary, .. } => summary.clone(),
	}
}

/// Return the cached record for `fingerprint`, or run `build` under the
/// `acquireBuild` dedup ticket and cache its result (spec §4.4: "tickets
/// MUST be released on completion or failure").
///
/// Callers coalesced behind a build in progress receive the owner's result;
/// if the owner's build fails, they see [`JournalError::AIUnavailable`].
pub async fn get_or_build<F, Fut>(
	doc: &JournalDocument,
	fingerprint: &Fingerprint,
	original_words: usize,
	build: F,
) -> JournalResult<SummaryRecord>
where
	F: FnOnce() -> Fut,
	Fut: Future<Output = JournalResult<SummaryContent>>,
{
	if let Some(record) = doc.summary_get(fingerprint) {
		return Ok(record);
	}

	match doc.acquire_build(fingerprint) {
		BuildOutcome::Owner(ticket) => match build().await {
			Ok(content) => {
				let words = word_count(&plain_text(&content)) as u32;
				let record = SummaryRecord {
					content,
					words,
					original_words: original_words as u32,
					timestamp: Timestamp::now().millis(),
				};
				ticket.complete(doc, record.clone())?;
				Ok(record)
			}
			Err(e) => {
				ticket.fail(doc);
				Err(e)
			}
		},
		BuildOutcome::Pending(pending) => pending.wait().await.ok_or(JournalError::AIUnavailable),
	}
}

/// Per-entry structured artifact (spec §4.4, §4.9 "per-entry structured
/// summarization"), cached under `entry:<id>`.
pub async fn structured_entry_summary(
	doc: &JournalDocument,
	gateway: &LlmGateway,
	id: &EntryId,
	content: &str,
) -> JournalResult<SummaryRecord> {
	let fingerprint = Fingerprint::entry(id);
	let original_words = word_count(content);
	get_or_build(doc, &fingerprint, original_words, || async { gateway.call_structured_entry_summary(content).await }).await
}

// vim: ts=4
