//! Context Builder (spec §4.6, C6): assembles a length-bounded text block
//! describing current state, for consumption by question generation and any
//! other prompt that needs a snapshot of the campaign so far.
//!
//! Determinism (spec §4.6): given identical inputs and cache state, output
//! is byte-identical; concurrent calls share pending summarizations via
//! [`journal_store::JournalDocument::acquire_build`] ([`crate::summarize`]).

use chrono::{TimeZone, Utc};
use journal_store::JournalDocument;
use journal_types::{Entry, Fingerprint, JournalResult};

use crate::config::PipelineConfig;
use crate::summarize::{get_or_build, plain_text, word_count};
use journal_llm::LlmGateway;

const RECENT_ENTRIES_INLINE: usize = 5;
const META_SUMMARY_THRESHOLD: usize = 10;

fn format_date(millis: i64) -> String {
	Utc.timestamp_millis_opt(millis).single().map_or_else(|| millis.to_string(), |dt| dt.format("%Y-%m-%d").to_string())
}

fn character_identity_line(doc: &JournalDocument) -> String {
	let all = doc.character_all();
	let name = all.get("name").filter(|s| !s.is_empty()).map_or("unnamed adventurer", String::as_str);
	let race = all.get("race").map(String::as_str).unwrap_or_default();
	let class = all.get("class").map(String::as_str).unwrap_or_default();
	format!("Character: {name} ({race}) — {class}")
}

/// Step 2: inline `backstory`/`notes` verbatim under the word budget, else
/// request a bounded summary, falling back to the full content on failure.
async fn character_field_text(
	doc: &JournalDocument,
	gateway: Option<&LlmGateway>,
	field: &str,
	config: &PipelineConfig,
) -> String {
	let content = doc.character_get(field).unwrap_or_default();
	if content.is_empty() || word_count(&content) <= config.character_words {
		return content;
	}
	let Some(gateway) = gateway else {
		return content;
	};
	let fingerprint = Fingerprint::character_field(field);
	let original_words = word_count(&content);
	let built = get_or_build(doc, &fingerprint, original_words, || async {
		let text = gateway.call_summary(&content).await?;
		Ok(journal_store::SummaryContent::Plain(text))
	})
	.await;
	match built {
		Ok(record) => plain_text(&record.content),
		Err(_) => content,
	}
}

/// Step 4: replace an over-budget entry's text with its structured summary.
async fn entry_text(doc: &JournalDocument, gateway: Option<&LlmGateway>, entry: &Entry, config: &PipelineConfig) -> String {
	if word_count(&entry.content) <= config.entry_words {
		return entry.content.clone();
	}
	let Some(gateway) = gateway else {
		return entry.content.clone();
	};
	match crate::summarize::structured_entry_summary(doc, gateway, &entry.id, &entry.content).await {
		Ok(record) => plain_text(&record.content),
		Err(_) => entry.content.clone(),
	}
}

async fn journal_section(doc: &JournalDocument, gateway: Option<&LlmGateway>, config: &PipelineConfig) -> String {
	let entries = doc.journal_list();

	let so_far = doc.chronicle_so_far_summary();
	let recent = doc.chronicle_recent_summary();
	if !so_far.is_empty() || !recent.is_empty() {
		let mut sections = Vec::new();
		if !so_far.is_empty() {
			sections.push(format!("So far: {so_far}"));
		}
		if !recent.is_empty() {
			sections.push(format!("Recently: {recent}"));
		}
		return sections.join("\n");
	}

	if entries.len() > META_SUMMARY_THRESHOLD {
		let (older, recent_tail) = entries.split_at(entries.len() - RECENT_ENTRIES_INLINE);
		let mut parts = Vec::new();
		if let Some(gateway) = gateway {
			let concatenated: String = older.iter().map(|e| e.content.as_str()).collect::<Vec<_>>().join("\n\n");
			let fingerprint = Fingerprint::meta_summary();
			let original_words = word_count(&concatenated);
			if let Ok(record) = get_or_build(doc, &fingerprint, original_words, || async {
				let text = gateway.call_summary(&concatenated).await?;
				Ok(journal_store::SummaryContent::Plain(text))
			})
			.await
			{
				parts.push(plain_text(&record.content));
			}
		}
		for entry in recent_tail {
			let text = entry_text(doc, gateway, entry, config).await;
			parts.push(format!("{}: {}", format_date(entry.timestamp.millis()), text));
		}
		return parts.join("\n");
	}

	let mut lines = Vec::with_capacity(entries.len());
	for entry in &entries {
		let text = entry_text(doc, gateway, entry, config).await;
		lines.push(format!("{}: {}", format_date(entry.timestamp.millis()), text));
	}
	lines.join("\n")
}

/// Build the length-bounded context block (spec §4.6).
pub async fn build_context(doc: &JournalDocument, gateway: Option<&LlmGateway>, config: &PipelineConfig) -> JournalResult<String> {
	let identity = character_identity_line(doc);
	let backstory = character_field_text(doc, gateway, "backstory", config).await;
	let notes = character_field_text(doc, gateway, "notes", config).await;
	let journal = journal_section(doc, gateway, config).await;

	let mut sections = vec![identity];
	if !backstory.is_empty() {
		sections.push(format!("Backstory: {backstory}"));
	}
	if !notes.is_empty() {
		sections.push(format!("Notes: {notes}"));
	}
	if !journal.is_empty() {
		sections.push(format!("Journal:\n{journal}"));
	}
	Ok(sections.join("\n\n"))
}


// vim: ts=4
