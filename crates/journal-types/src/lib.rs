//! Shared scalar types and error taxonomy for the dnd-journal core.
//!
//! No subsystem logic lives here — only the value types every other
//! `journal-*` crate needs (spec §3, §7, §9).

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod entry;
mod error;
mod fingerprint;
mod ids;
mod timestamp;

pub use entry::{compare_canonical, sort_canonical, Entry};
pub use error::{JournalError, JournalResult};
pub use fingerprint::Fingerprint;
pub use ids::{EntryId, Seq};
pub use timestamp::Timestamp;

/// Default partition size for the Parts Engine (spec §4.7).
pub const DEFAULT_PART_SIZE: usize = 10;

/// Default word-count budget for character fields inlined verbatim (spec §4.6).
pub const DEFAULT_CHARACTER_WORDS: usize = 300;

/// Default word-count budget per journal entry before it is replaced by a
/// summary (spec §4.6).
pub const DEFAULT_ENTRY_WORDS: usize = 200;

/// Freshness window for cached reflective questions (spec §4.8).
pub const QUESTIONS_FRESHNESS_SECS: i64 = 3600;

/// Threshold of un-anchored entries that triggers a new anchor summary
/// (spec §4.7, "Anchor mechanism").
pub const ANCHOR_THRESHOLD: usize = 10;

pub mod prelude {
	pub use crate::{
		compare_canonical, sort_canonical, Entry, EntryId, Fingerprint, JournalError,
		JournalResult, Seq, Timestamp,
	};
}

// vim: ts=4
