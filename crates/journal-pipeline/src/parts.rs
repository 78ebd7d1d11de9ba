//! Parts Engine (spec §4.7, C7): hierarchical summarization over the
//! Journal. Closes fixed-size parts as the Journal grows, rolls their
//! summaries up into a cumulative "so far" summary, and keeps a "recent"
//! summary over the still-open tail.
//!
//! `journal:part:<i>`/`journal:part:<i>:title` are content-addressed — a
//! closed part's entries never change, so a plain cache-first
//! [`get_or_build`] is correct for them, same as the Context Builder's
//! treatment of `entry:<id>`/`character:<field>`.
//!
//! `journal:recent-summary`/`journal:so-far-latest` are different: their
//! fingerprints are fixed, but the content behind them (the open tail, the
//! roll-up of closed parts) changes as the Journal grows. A plain
//! cache-first read would go stale forever after the first build; always
//! invalidating would break "calling evaluate twice without intervening
//! mutations is a no-op". [`PartsEngine`] resolves this by memoizing the
//! last-seen source text for each of the two rolling fingerprints and only
//! invalidating+rebuilding when that source actually changed.

use std::sync::Mutex;

use journal_llm::LlmGateway;
use journal_store::{JournalDocument, Part, SummaryContent, SummaryRecord};
use journal_types::{Entry, EntryId, Fingerprint, JournalError, JournalResult, Timestamp, ANCHOR_THRESHOLD};

use crate::config::PipelineConfig;
use crate::summarize::{get_or_build, plain_text, word_count};

pub struct PartsEngine {
	last_so_far_source: Mutex<Option<String>>,
	last_recent_source: Mutex<Option<String>>,
}

impl Default for PartsEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl PartsEngine {
	pub fn new() -> Self {
		Self { last_so_far_source: Mutex::new(None), last_recent_source: Mutex::new(None) }
	}

	/// Close part `index` (1-based) over `entries[(index-1)*part_size .. index*part_size]`,
	/// recording structural membership regardless of whether a summary could
	/// be built (spec §4.7 "Failure semantics": structural membership is
	/// always recorded; summaries are left empty when the gateway is
	/// unavailable).
	async fn close_part(
		&self,
		doc: &JournalDocument,
		gateway: Option<&LlmGateway>,
		config: &PipelineConfig,
		entries: &[Entry],
		index: u32,
	) -> JournalResult<()> {
		let start = (index as usize - 1) * config.part_size;
		let end = (index as usize * config.part_size).min(entries.len());
		let slice = &entries[start..end];
		let ids: Vec<EntryId> = slice.iter().map(|e| e.id.clone()).collect();
		let concatenated = slice.iter().map(|e| e.content.as_str()).collect::<Vec<_>>().join("\n\n");

		self.record_part_entries(doc, index, &ids)?;

		let (summary, title) = match gateway {
			Some(gateway) if !concatenated.is_empty() => {
				let original_words = word_count(&concatenated);
				let summary = get_or_build(doc, &Fingerprint::part_summary(index), original_words, || async {
					Ok(SummaryContent::Plain(gateway.call_summary(&concatenated).await?))
				})
				.await
				.map(|r| plain_text(&r.content))
				.unwrap_or_default();

				let title_prompt = format!("Give a short title (a few words) for this part of the story:\n\n{concatenated}");
				let title = get_or_build(doc, &Fingerprint::part_title(index), original_words, || async {
					Ok(SummaryContent::Plain(gateway.call_summary(&title_prompt).await?))
				})
				.await
				.map(|r| plain_text(&r.content))
				.unwrap_or_default();

				(summary, title)
			}
			_ => (String::new(), String::new()),
		};

		doc.chronicle_set_part(index, Part { title, summary, entries: ids })?;
		doc.chronicle_set_latest_part_index(index)?;
		Ok(())
	}

	/// Record `journal:part:<i>:entries` in the Summary Cache (spec.md §4.4
	/// taxonomy, §4.7 `ClosingPart(i)`). This is structural, not an LLM
	/// artifact, so unlike the summary/title alongside it, it's written
	/// regardless of Gateway availability — the Chronicle's `Part.entries`
	/// is the read path pipeline code uses, but the cache copy is still a
	/// named fingerprint other consumers may `get`/`exists` against.
	fn record_part_entries(&self, doc: &JournalDocument, index: u32, ids: &[EntryId]) -> JournalResult<()> {
		let encoded = serde_json::to_string(ids).map_err(|e| JournalError::ParseError(format!("encode part entries: {e}")))?;
		let record = SummaryRecord {
			content: SummaryContent::Plain(encoded),
			words: 0,
			original_words: ids.len() as u32,
			timestamp: Timestamp::now().millis(),
		};
		doc.summary_set(&Fingerprint::part_entries(index), &record)
	}

	/// Roll up all closed parts' summaries into `journal:so-far-latest`,
	/// skipping the rebuild entirely when the roll-up source hasn't changed
	/// since the last call.
	async fn rebuild_so_far(&self, doc: &JournalDocument, gateway: Option<&LlmGateway>, _config: &PipelineConfig) -> JournalResult<()> {
		let source = doc
			.chronicle_parts()
			.values()
			.map(|p| p.summary.as_str())
			.filter(|s| !s.is_empty())
			.collect::<Vec<_>>()
			.join("\n\n");

		{
			let last = self.last_so_far_source.lock().unwrap_or_else(|e| e.into_inner());
			if last.as_deref() == Some(source.as_str()) {
				return Ok(());
			}
		}

		let fingerprint = Fingerprint::so_far_latest();
		if doc.summary_get(&fingerprint).is_some() {
			doc.summary_invalidate(&fingerprint)?;
		}

		let summary = match gateway {
			Some(gateway) if !source.is_empty() => {
				let original_words = word_count(&source);
				get_or_build(doc, &fingerprint, original_words, || async {
					Ok(SummaryContent::Plain(gateway.call_summary(&source).await?))
				})
				.await
				.map(|r| plain_text(&r.content))
				.unwrap_or_default()
			}
			_ => String::new(),
		};

		doc.chronicle_set_so_far_summary(&summary)?;
		*self.last_so_far_source.lock().unwrap_or_else(|e| e.into_inner()) = Some(source);
		Ok(())
	}

	/// Summarize the still-open tail (entries past the last closed part)
	/// into `journal:recent-summary`, with the same no-op-when-unchanged
	/// memoization as [`Self::rebuild_so_far`].
	async fn refresh_recent(
		&self,
		doc: &JournalDocument,
		gateway: Option<&LlmGateway>,
		config: &PipelineConfig,
		entries: &[Entry],
	) -> JournalResult<()> {
		let closed = doc.chronicle_latest_part_index() as usize;
		let tail_start = (closed * config.part_size).min(entries.len());
		let tail = &entries[tail_start..];
		let source = tail.iter().map(|e| e.content.as_str()).collect::<Vec<_>>().join("\n\n");

		{
			let last = self.last_recent_source.lock().unwrap_or_else(|e| e.into_inner());
			if last.as_deref() == Some(source.as_str()) {
				return Ok(());
			}
		}

		let fingerprint = Fingerprint::recent_summary();
		if doc.summary_get(&fingerprint).is_some() {
			doc.summary_invalidate(&fingerprint)?;
		}

		let summary = match gateway {
			Some(gateway) if !source.is_empty() => {
				let original_words = word_count(&source);
				get_or_build(doc, &fingerprint, original_words, || async {
					Ok(SummaryContent::Plain(gateway.call_summary(&source).await?))
				})
				.await
				.map(|r| plain_text(&r.content))
				.unwrap_or_default()
			}
			_ => String::new(),
		};

		doc.chronicle_set_recent_summary(&summary)?;
		*self.last_recent_source.lock().unwrap_or_else(|e| e.into_inner()) = Some(source);
		Ok(())
	}

	/// Single evaluation pass (spec §4.7 `Evaluate`): closes at most one
	/// part per call (the "Fairness" requirement), then refreshes the
	/// recent-tail summary.
	pub async fn evaluate(&self, doc: &JournalDocument, gateway: Option<&LlmGateway>, config: &PipelineConfig) -> JournalResult<()> {
		let entries = doc.journal_list();
		let next_index = doc.chronicle_latest_part_index() + 1;
		if entries.len() >= next_index as usize * config.part_size {
			self.close_part(doc, gateway, config, &entries, next_index).await?;
			self.rebuild_so_far(doc, gateway, config).await?;
		}
		self.refresh_recent(doc, gateway, config, &entries).await?;
		Ok(())
	}

	/// One-shot hydration sweep: closes every outstanding part in sequence,
	/// guarded idempotent by `latestPartIndex == 0` so it only ever runs
	/// once per document (spec §4.7 "Backfill").
	pub async fn backfill(&self, doc: &JournalDocument, gateway: Option<&LlmGateway>, config: &PipelineConfig) -> JournalResult<()> {
		if doc.chronicle_latest_part_index() != 0 {
			return Ok(());
		}
		let entries = doc.journal_list();
		let mut index = 0u32;
		while entries.len() >= (index as usize + 1) * config.part_size {
			index += 1;
			self.close_part(doc, gateway, config, &entries, index).await?;
		}
		if index > 0 {
			self.rebuild_so_far(doc, gateway, config).await?;
		}
		self.refresh_recent(doc, gateway, config, &entries).await?;
		Ok(())
	}

	/// Re-summarize closed parts whose summary is empty (spec §8 scenario
	/// S4: closed with the gateway unavailable, then caught up once it
	/// becomes available), then refresh the roll-ups that depend on them.
	pub async fn catchup(&self, doc: &JournalDocument, gateway: Option<&LlmGateway>, config: &PipelineConfig) -> JournalResult<()> {
		if gateway.is_none() {
			return Ok(());
		}
		let entries = doc.journal_list();
		for index in 1..=doc.chronicle_latest_part_index() {
			let empty = doc.chronicle_get_part(index).map(|p| p.summary.is_empty()).unwrap_or(false);
			if empty {
				self.close_part(doc, gateway, config, &entries, index).await?;
			}
		}
		self.rebuild_so_far(doc, gateway, config).await?;
		self.refresh_recent(doc, gateway, config, &entries).await?;
		Ok(())
	}

	/// Anchor mechanism (spec §4.7, independent alternative pipeline):
	/// once `ANCHOR_THRESHOLD` entries have accumulated past
	/// `latest-anchor-seq`, summarize the full prefix up to the highest
	/// `seq` seen and advance the anchor. `journal:anchor:seq:<n>` is
	/// content-addressed on `n`, so advancement is naturally idempotent and
	/// needs no invalidation.
	pub async fn anchor_catchup(&self, doc: &JournalDocument, gateway: Option<&LlmGateway>) -> JournalResult<()> {
		let Some(gateway) = gateway else {
			return Ok(());
		};
		let entries = doc.journal_list();
		let anchor_seq = doc.latest_anchor_seq();
		let beyond: Vec<&Entry> = entries.iter().filter(|e| e.seq.is_some_and(|s| s.0 > anchor_seq)).collect();
		if beyond.len() < ANCHOR_THRESHOLD {
			return Ok(());
		}
		let Some(max_seq) = beyond.iter().filter_map(|e| e.seq).map(|s| s.0).max() else {
			return Ok(());
		};

		let concatenated = entries
			.iter()
			.filter(|e| e.seq.is_some_and(|s| s.0 <= max_seq))
			.map(|e| e.content.as_str())
			.collect::<Vec<_>>()
			.join("\n\n");
		let fingerprint = Fingerprint::anchor_seq(max_seq);
		let original_words = word_count(&concatenated);
		get_or_build(doc, &fingerprint, original_words, || async {
			Ok(SummaryContent::Plain(gateway.call_summary(&concatenated).await?))
		})
		.await?;

		doc.set_latest_anchor_seq(max_seq)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn close_part_records_structure_without_a_gateway() {
		let doc = JournalDocument::new();
		let config = PipelineConfig { part_size: 2, ..Default::default() };
		doc.journal_append("e0", "entry 0").unwrap();
		doc.journal_append("e1", "entry 1").unwrap();
		let engine = PartsEngine::new();

		engine.evaluate(&doc, None, &config).await.unwrap();

		assert_eq!(doc.chronicle_latest_part_index(), 1);
		let part = doc.chronicle_get_part(1).unwrap();
		assert_eq!(part.entries.len(), 2);
		assert_eq!(part.summary, "");
		assert_eq!(part.title, "");
	}

	#[tokio::test]
	async fn close_part_writes_the_entries_fingerprint_regardless_of_gateway() {
		let doc = JournalDocument::new();
		let config = PipelineConfig { part_size: 2, ..Default::default() };
		doc.journal_append("e0", "entry 0").unwrap();
		doc.journal_append("e1", "entry 1").unwrap();
		let engine = PartsEngine::new();

		engine.evaluate(&doc, None, &config).await.unwrap();

		let record = doc.summary_get(&Fingerprint::part_entries(1)).unwrap();
		let SummaryContent::Plain(encoded) = record.content else {
			unreachable!("part entries are always stored as plain encoded JSON");
		};
		let ids: Vec<EntryId> = serde_json::from_str(&encoded).unwrap();
		assert_eq!(ids, vec![EntryId::new("e0"), EntryId::new("e1")]);
	}

	#[tokio::test]
	async fn evaluate_closes_at_most_one_part_per_call() {
		let doc = JournalDocument::new();
		let config = PipelineConfig { part_size: 2, ..Default::default() };
		for i in 0..4 {
			doc.journal_append(format!("e{i}"), format!("entry {i}")).unwrap();
		}
		let engine = PartsEngine::new();

		engine.evaluate(&doc, None, &config).await.unwrap();
		assert_eq!(doc.chronicle_latest_part_index(), 1);

		engine.evaluate(&doc, None, &config).await.unwrap();
		assert_eq!(doc.chronicle_latest_part_index(), 2);
	}

	#[tokio::test]
	async fn backfill_closes_all_outstanding_parts_in_one_sweep() {
		let doc = JournalDocument::new();
		let config = PipelineConfig { part_size: 2, ..Default::default() };
		for i in 0..5 {
			doc.journal_append(format!("e{i}"), format!("entry {i}")).unwrap();
		}
		let engine = PartsEngine::new();

		engine.backfill(&doc, None, &config).await.unwrap();

		assert_eq!(doc.chronicle_latest_part_index(), 2);
	}

	#[tokio::test]
	async fn backfill_is_a_no_op_once_a_part_has_closed() {
		let doc = JournalDocument::new();
		let config = PipelineConfig { part_size: 2, ..Default::default() };
		for i in 0..2 {
			doc.journal_append(format!("e{i}"), format!("entry {i}")).unwrap();
		}
		let engine = PartsEngine::new();
		engine.backfill(&doc, None, &config).await.unwrap();
		assert_eq!(doc.chronicle_latest_part_index(), 1);

		doc.chronicle_set_latest_part_index(1).unwrap();
		doc.journal_append("e2", "entry 2").unwrap();
		doc.journal_append("e3", "entry 3").unwrap();
		engine.backfill(&doc, None, &config).await.unwrap();

		assert_eq!(doc.chronicle_latest_part_index(), 1, "backfill only ever runs once per document");
	}

	#[tokio::test]
	async fn refresh_recent_is_a_no_op_when_the_open_tail_is_unchanged() {
		let doc = JournalDocument::new();
		doc.journal_append("e1", "a short entry").unwrap();
		let config = PipelineConfig::default();
		let engine = PartsEngine::new();
		let entries = doc.journal_list();

		engine.refresh_recent(&doc, None, &config, &entries).await.unwrap();
		doc.chronicle_set_recent_summary("sentinel").unwrap();

		engine.refresh_recent(&doc, None, &config, &entries).await.unwrap();

		assert_eq!(doc.chronicle_recent_summary(), "sentinel");
	}

	#[tokio::test]
	async fn anchor_catchup_without_a_gateway_leaves_the_anchor_untouched() {
		let doc = JournalDocument::new();
		for i in 0..(ANCHOR_THRESHOLD + 1) {
			doc.journal_append(format!("e{i}"), format!("entry {i}")).unwrap();
		}
		let engine = PartsEngine::new();

		engine.anchor_catchup(&doc, None).await.unwrap();

		assert_eq!(doc.latest_anchor_seq(), 0);
	}

	#[tokio::test]
	async fn catchup_is_a_no_op_without_a_gateway() {
		let doc = JournalDocument::new();
		let config = PipelineConfig { part_size: 2, ..Default::default() };
		doc.journal_append("e0", "entry 0").unwrap();
		doc.journal_append("e1", "entry 1").unwrap();
		let engine = PartsEngine::new();
		engine.evaluate(&doc, None, &config).await.unwrap();
		assert_eq!(doc.chronicle_get_part(1).unwrap().summary, "");

		engine.catchup(&doc, None, &config).await.unwrap();

		assert_eq!(doc.chronicle_get_part(1).unwrap().summary, "");
	}

	#[tokio::test]
	async fn anchor_catchup_is_a_no_op_below_threshold() {
		let doc = JournalDocument::new();
		doc.journal_append("e0", "entry 0").unwrap();
		let engine = PartsEngine::new();

		engine.anchor_catchup(&doc, None).await.unwrap();

		assert_eq!(doc.latest_anchor_seq(), 0);
	}
}

// vim: ts=4
