//! Canonical fingerprint strings (spec §4.4).
//!
//! A fingerprint identifies a cacheable LLM artifact. Constructors here are
//! the sole place fingerprint strings are assembled so the taxonomy in
//! spec §4.4 stays centralized and typo-proof.

use crate::ids::EntryId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(pub Box<str>);

impl Fingerprint {
	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn entry(id: &EntryId) -> Self {
		Self(format!("entry:{}", id.as_str()).into())
	}

	pub fn character_field(field: &str) -> Self {
		Self(format!("character:{field}").into())
	}

	pub fn part_summary(index: u32) -> Self {
		Self(format!("journal:part:{index}").into())
	}

	pub fn part_title(index: u32) -> Self {
		Self(format!("journal:part:{index}:title").into())
	}

	pub fn part_entries(index: u32) -> Self {
		Self(format!("journal:part:{index}:entries").into())
	}

	pub fn recent_summary() -> Self {
		Self("journal:recent-summary".into())
	}

	pub fn so_far_latest() -> Self {
		Self("journal:so-far-latest".into())
	}

	pub fn anchor_seq(n: u64) -> Self {
		Self(format!("journal:anchor:seq:{n}").into())
	}

	pub fn meta_summary() -> Self {
		Self("journal:meta-summary".into())
	}

	pub fn questions(context_digest_b64: &str) -> Self {
		Self(format!("questions:{context_digest_b64}").into())
	}
}

impl std::fmt::Display for Fingerprint {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl AsRef<str> for Fingerprint {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn entry_fingerprint_roundtrips_id() {
		let id = EntryId::new("e1");
		assert_eq!(Fingerprint::entry(&id).as_str(), "entry:e1");
	}

	#[test]
	fn part_fingerprints_are_distinct() {
		assert_ne!(Fingerprint::part_summary(1).as_str(), Fingerprint::part_title(1).as_str());
		assert_ne!(Fingerprint::part_summary(1).as_str(), Fingerprint::part_summary(2).as_str());
	}

	#[test]
	fn anchor_fingerprint_embeds_seq() {
		assert_eq!(Fingerprint::anchor_seq(42).as_str(), "journal:anchor:seq:42");
	}
}

// vim: ts=4
