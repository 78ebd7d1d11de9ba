//! Tunable budgets for the pipeline (spec §4.6, §4.7, §4.8).

use journal_types::{
	DEFAULT_CHARACTER_WORDS, DEFAULT_ENTRY_WORDS, DEFAULT_PART_SIZE, QUESTIONS_FRESHNESS_SECS,
};

#[derive(Clone, Copy, Debug)]
pub struct PipelineConfig {
	/// Closed-part size (spec §4.7, default 10).
	pub part_size: usize,
	/// Word budget before a character field is summarized (spec §4.6, default 300).
	pub character_words: usize,
	/// Word budget before a journal entry is summarized (spec §4.6, default 200).
	pub entry_words: usize,
	/// Freshness window for cached reflective questions, in seconds (spec §4.8, default 3600).
	pub questions_freshness_secs: i64,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			part_size: DEFAULT_PART_SIZE,
			character_words: DEFAULT_CHARACTER_WORDS,
			entry_words: DEFAULT_ENTRY_WORDS,
			questions_freshness_secs: QUESTIONS_FRESHNESS_SECS,
		}
	}
}

// vim: ts=4
