//! The named sub-collections of the replicated document (spec §3).

/// Identifies one of the document's named sub-collections.
///
/// Used both to route `observe` registrations and to tag change
/// notifications so a single listener can subscribe to several
/// sub-collections and still tell them apart.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SubCollection {
	Character,
	Journal,
	Settings,
	Summaries,
	Chronicle,
	QuestionsCache,
}

impl SubCollection {
	/// The exact shared-type name persisted inside the `yrs::Doc`
	/// (spec §3 "Persisted state layout").
	pub(crate) fn type_name(self) -> &'static str {
		match self {
			SubCollection::Character => "character",
			SubCollection::Journal => "journal-entries",
			SubCollection::Settings => "settings",
			SubCollection::Summaries => "summaries",
			SubCollection::Chronicle => "chronicle",
			SubCollection::QuestionsCache => "ai-questions-cache",
		}
	}
}

/// Where a mutation to a sub-collection originated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChangeOrigin {
	Local,
	Remote,
}

/// Delivered to `observe` listeners after a sub-collection mutation.
#[derive(Clone, Copy, Debug)]
pub struct ChangeEvent {
	pub collection: SubCollection,
	pub origin: ChangeOrigin,
}

// vim: ts=4
