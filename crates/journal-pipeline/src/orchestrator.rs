//! Event Orchestrator (spec §4.9, C9): subscribes to C1 change
//! notifications and dispatches follow-up pipeline work.
//!
//! `JournalDocument::notify` invokes observers synchronously and in
//! registration order, so an observer closure here must not itself run
//! async pipeline work — doing so would recurse into `notify` the moment
//! it touched the document. Instead each closure only forwards a tag onto
//! an unbounded channel; a single background task drains it and does the
//! actual work, one event at a time, strictly in arrival order. That
//! decoupling is what gives handlers their re-entrancy protection: pipeline
//! work never runs on the same call stack as the mutation that triggered
//! it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use journal_llm::LlmGateway;
use journal_store::{JournalDocument, SubCollection};
use journal_types::{Fingerprint, JournalResult};

use crate::config::PipelineConfig;
use crate::parts::PartsEngine;

#[derive(Clone, Copy, Debug)]
enum DispatchEvent {
	Journal,
	Character,
	Settings,
	Summaries,
}

/// Owns the orchestrator's background dispatch task and its `observe`
/// registrations. Dropping it aborts the task; the registrations
/// themselves are inert once that happens.
pub struct Orchestrator {
	_subscriptions: Vec<journal_store::Subscription>,
	task: JoinHandle<()>,
}

impl Orchestrator {
	/// Register observers on `doc` and spawn the dispatch loop. Runs an
	/// initial backfill sweep before accepting events, mirroring "begin
	/// hydration immediately" (spec §4.2).
	pub fn spawn(doc: Arc<JournalDocument>, gateway: Option<Arc<LlmGateway>>, config: PipelineConfig) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();

		// Baselines must be read before the observers below are registered:
		// `notify` runs observer closures synchronously inside whatever thread
		// calls the mutator, so a baseline read from inside the spawned task
		// would race against any mutation landing between this function
		// returning and the task's first poll.
		let last_character = doc.character_all();
		let ai_enabled = doc.ai_enabled();

		let subscriptions = vec![
			{
				let tx = tx.clone();
				doc.observe(move |event| {
					if event.collection == SubCollection::Journal {
						let _ = tx.send(DispatchEvent::Journal);
					}
				})
			},
			{
				let tx = tx.clone();
				doc.observe(move |event| {
					if event.collection == SubCollection::Character {
						let _ = tx.send(DispatchEvent::Character);
					}
				})
			},
			{
				let tx = tx.clone();
				doc.observe(move |event| {
					if event.collection == SubCollection::Settings {
						let _ = tx.send(DispatchEvent::Settings);
					}
				})
			},
			{
				let tx = tx.clone();
				doc.observe(move |event| {
					if event.collection == SubCollection::Summaries {
						let _ = tx.send(DispatchEvent::Summaries);
					}
				})
			},
		];

		let task = tokio::spawn(Self::run(doc, gateway, config, rx, last_character, ai_enabled));

		Self { _subscriptions: subscriptions, task }
	}

	async fn run(
		doc: Arc<JournalDocument>,
		gateway: Option<Arc<LlmGateway>>,
		config: PipelineConfig,
		mut rx: mpsc::UnboundedReceiver<DispatchEvent>,
		mut last_character: BTreeMap<String, String>,
		mut ai_enabled: bool,
	) {
		let parts = PartsEngine::new();
		let gw = gateway.as_deref();

		Self::log_unless_degraded("backfill", parts.backfill(&doc, gw, &config).await);

		while let Some(event) = rx.recv().await {
			match event {
				DispatchEvent::Journal => {
					debug!("journal changed, evaluating parts engine");
					Self::log_unless_degraded("evaluate", parts.evaluate(&doc, gw, &config).await);
					Self::summarize_missing_entries(&doc, gw).await;
				}
				DispatchEvent::Character => {
					Self::invalidate_changed_character_fields(&doc, &mut last_character);
				}
				DispatchEvent::Settings => {
					let now_enabled = doc.ai_enabled();
					if !ai_enabled && now_enabled {
						debug!("ai-enabled flipped false -> true, catching up");
						Self::log_unless_degraded("catchup", parts.catchup(&doc, gw, &config).await);
						Self::log_unless_degraded("anchor_catchup", parts.anchor_catchup(&doc, gw).await);
					}
					ai_enabled = now_enabled;
				}
				DispatchEvent::Summaries => {
					debug!("summaries changed, UI collaborators observe this directly");
				}
			}
		}
	}

	/// Swallow an error from a pipeline step (spec §7: the pipeline is
	/// expected to continue past `AIUnavailable` and transport failures),
	/// but log anything else — those indicate a real bug, not a gateway
	/// that's temporarily unreachable.
	fn log_unless_degraded(step: &str, result: JournalResult<()>) {
		if let Err(e) = result {
			if e.is_degraded_mode() {
				debug!(step, error = %e, "pipeline step degraded, continuing");
			} else {
				warn!(step, error = %e, "pipeline step failed");
			}
		}
	}

	async fn summarize_missing_entries(doc: &JournalDocument, gateway: Option<&LlmGateway>) {
		let Some(gateway) = gateway else {
			return;
		};
		for entry in doc.journal_list() {
			if doc.summary_get(&Fingerprint::entry(&entry.id)).is_none() {
				let result = crate::summarize::structured_entry_summary(doc, gateway, &entry.id, &entry.content).await;
				Self::log_unless_degraded("structured_entry_summary", result.map(|_| ()));
			}
		}
	}

	fn invalidate_changed_character_fields(doc: &JournalDocument, last: &mut BTreeMap<String, String>) {
		let current = doc.character_all();
		for (field, value) in &current {
			if last.get(field) != Some(value) {
				Self::log_unless_degraded("summary_invalidate", doc.summary_invalidate(&Fingerprint::character_field(field)));
			}
		}
		*last = current;
	}
}

impl Drop for Orchestrator {
	fn drop(&mut self) {
		self.task.abort();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	async fn wait_until(mut pred: impl FnMut() -> bool) {
		for _ in 0..200 {
			if pred() {
				return;
			}
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
		panic!("condition never became true");
	}

	#[tokio::test]
	async fn journal_changes_close_parts_without_a_gateway() {
		let doc = Arc::new(JournalDocument::new());
		let config = PipelineConfig { part_size: 2, ..Default::default() };
		let _orchestrator = Orchestrator::spawn(doc.clone(), None, config);

		doc.journal_append("e0", "entry 0").unwrap();
		doc.journal_append("e1", "entry 1").unwrap();

		wait_until(|| doc.chronicle_latest_part_index() == 1).await;
		assert_eq!(doc.chronicle_get_part(1).unwrap().entries.len(), 2);
	}

	#[tokio::test]
	async fn character_field_change_invalidates_its_cached_summary() {
		// The `character_set` below lands before the dispatch task spawned
		// by `Orchestrator::spawn` gets its first poll, so this only
		// reliably catches a regression in the baseline-capture timing
		// because `last_character` is read synchronously inside `spawn`
		// rather than at the top of the task.
		let doc = Arc::new(JournalDocument::new());
		let config = PipelineConfig::default();
		doc.character_set("backstory", "original").unwrap();
		let fingerprint = Fingerprint::character_field("backstory");
		doc.summary_set(
			&fingerprint,
			&journal_store::SummaryRecord {
				content: journal_store::SummaryContent::Plain("cached".to_string()),
				words: 1,
				original_words: 1,
				timestamp: 0,
			},
		)
		.unwrap();

		let _orchestrator = Orchestrator::spawn(doc.clone(), None, config);
		doc.character_set("backstory", "revised").unwrap();

		wait_until(|| doc.summary_get(&fingerprint).is_none()).await;
	}

	#[tokio::test]
	async fn unrelated_character_field_left_cached() {
		let doc = Arc::new(JournalDocument::new());
		let config = PipelineConfig::default();
		doc.character_set("backstory", "unchanged".to_string().as_str()).unwrap();
		let fingerprint = Fingerprint::character_field("backstory");
		doc.summary_set(
			&fingerprint,
			&journal_store::SummaryRecord {
				content: journal_store::SummaryContent::Plain("cached".to_string()),
				words: 1,
				original_words: 1,
				timestamp: 0,
			},
		)
		.unwrap();

		let _orchestrator = Orchestrator::spawn(doc.clone(), None, config);
		doc.character_set("name", "Elenwe").unwrap();

		wait_until(|| doc.character_get("name").as_deref() == Some("Elenwe")).await;
		assert!(doc.summary_get(&fingerprint).is_some());
	}
}

// vim: ts=4
