//! Question Generator (spec §4.8, C8): produces cached reflective prompts
//! from a digest of character identity and the ordered Journal.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use journal_llm::LlmGateway;
use journal_store::{JournalDocument, QuestionsRecord, CHARACTER_FIELDS};
use journal_types::{Fingerprint, JournalResult, Timestamp};

use crate::config::PipelineConfig;

const QUESTIONS_SYSTEM_PROMPT: &str = "You write short, reflective journaling prompts for a tabletop \
	roleplaying character. Given the character and the story so far, respond with a handful of \
	open-ended questions, one per line, with no numbering or extra commentary.";

fn context_digest(doc: &JournalDocument) -> String {
	let mut hasher = Sha256::new();
	for field in CHARACTER_FIELDS {
		hasher.update(field.as_bytes());
		hasher.update([0u8]);
		hasher.update(doc.character_get(field).unwrap_or_default().as_bytes());
		hasher.update([0u8]);
	}
	for entry in doc.journal_list() {
		hasher.update(entry.id.as_str().as_bytes());
		hasher.update([0u8]);
		hasher.update(entry.content.as_bytes());
		hasher.update([0u8]);
		hasher.update(entry.timestamp.millis().to_le_bytes());
	}
	URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// `generateQuestions(force)` (spec §4.8). Within the freshness window a
/// cached set is returned untouched; past it, or when `force` is set, a
/// fresh set is generated and written back under the same fingerprint
/// (spec: "forced regeneration bypasses freshness but still writes into
/// the cache").
pub async fn get_or_generate(
	doc: &JournalDocument,
	gateway: &LlmGateway,
	config: &PipelineConfig,
	force: bool,
) -> JournalResult<String> {
	let fingerprint = Fingerprint::questions(&context_digest(doc));

	if !force {
		if let Some(record) = doc.questions_get(&fingerprint) {
			if Timestamp::from_millis(record.timestamp).elapsed_secs() < config.questions_freshness_secs {
				return Ok(record.questions);
			}
		}
	}

	let context = crate::context::build_context(doc, Some(gateway), config).await?;
	let questions = gateway.call_questions(QUESTIONS_SYSTEM_PROMPT, &context).await?;

	doc.questions_set(&fingerprint, &QuestionsRecord { questions: questions.clone(), timestamp: Timestamp::now().millis() })?;
	Ok(questions)
}


// vim: ts=4
