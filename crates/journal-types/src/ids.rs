//! Opaque identifiers used across the journal core.

use serde::{Deserialize, Serialize};

/// Stable opaque entry identifier (spec §3: "id: stable opaque string").
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct EntryId(pub Box<str>);

impl EntryId {
	pub fn new(id: impl Into<Box<str>>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for EntryId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for EntryId {
	fn from(s: &str) -> Self {
		Self(s.into())
	}
}

impl From<String> for EntryId {
	fn from(s: String) -> Self {
		Self(s.into_boxed_str())
	}
}

/// Locally-assigned, per-replica monotonic sequence number (spec §3: "seq").
///
/// Not globally monotonic; see spec §9 for the canonical-order tiebreak.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Seq(pub u64);

// vim: ts=4
