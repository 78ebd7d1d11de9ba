//! Process-level configuration (spec §4.12, ambient): everything that is
//! not itself replicated document state.

use std::path::PathBuf;

use journal_types::{DEFAULT_CHARACTER_WORDS, DEFAULT_ENTRY_WORDS, DEFAULT_PART_SIZE, QUESTIONS_FRESHNESS_SECS};

const ENV_STORE_PATH: &str = "DND_JOURNAL_STORE_PATH";
const DEFAULT_STORE_PATH: &str = "./data/dnd-journal.redb";

fn default_store_path() -> PathBuf {
	std::env::var(ENV_STORE_PATH).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH))
}

/// Process-wide configuration (spec §4.12). Per-document settings (API
/// key, `ai-enabled`, sync URL) live inside the CRDT's Settings
/// sub-collection instead — see [`journal_store::JournalDocument`]'s
/// `settings` accessors — and are deliberately not duplicated here.
#[derive(Clone, Debug)]
pub struct JournalConfig {
	pub store_path: PathBuf,
	pub part_size: usize,
	pub character_words: usize,
	pub entry_words: usize,
	pub questions_freshness_secs: i64,
}

impl Default for JournalConfig {
	fn default() -> Self {
		Self {
			store_path: default_store_path(),
			part_size: DEFAULT_PART_SIZE,
			character_words: DEFAULT_CHARACTER_WORDS,
			entry_words: DEFAULT_ENTRY_WORDS,
			questions_freshness_secs: QUESTIONS_FRESHNESS_SECS,
		}
	}
}

impl From<&JournalConfig> for journal_pipeline::PipelineConfig {
	fn from(config: &JournalConfig) -> Self {
		journal_pipeline::PipelineConfig {
			part_size: config.part_size,
			character_words: config.character_words,
			entry_words: config.entry_words,
			questions_freshness_secs: config.questions_freshness_secs,
		}
	}
}

// vim: ts=4
