//! The Replicated Store, Settings Projection, and Summary Cache (spec §4.1,
//! §4.3, §4.4 — components C1, C3, C4).
//!
//! A single [`JournalDocument`] wraps one `yrs::Doc` and exposes typed
//! accessors for each of its six named sub-collections. Concurrent
//! `acquireBuild` requests for the same fingerprint are coalesced in
//! [`summaries`].

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod character;
mod chronicle;
mod document;
mod journal;
mod merge;
mod questions;
mod settings;
mod subcollection;
mod summaries;

pub use character::CHARACTER_FIELDS;
pub use chronicle::Part;
pub use document::{JournalDocument, Subscription};
pub use merge::{shallow_merge, MergeError};
pub use questions::QuestionsRecord;
pub use subcollection::{ChangeEvent, ChangeOrigin, SubCollection};
pub use summaries::{BuildOutcome, BuildTicket, PendingBuild, SummaryContent, SummaryRecord};

pub mod prelude {
	pub use crate::{
		BuildOutcome, ChangeEvent, ChangeOrigin, JournalDocument, Part, QuestionsRecord, SubCollection,
		SummaryContent, SummaryRecord,
	};
}

// vim: ts=4
