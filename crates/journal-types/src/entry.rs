//! Entry value type and canonical ordering (spec §3, §4.7, §9).

use crate::ids::{EntryId, Seq};
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entry {
	pub id: EntryId,
	pub content: String,
	pub timestamp: Timestamp,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub seq: Option<Seq>,
}

impl Entry {
	pub fn new(id: impl Into<EntryId>, content: impl Into<String>, timestamp: Timestamp) -> Self {
		Self { id: id.into(), content: content.into(), timestamp, seq: None }
	}

	pub fn with_seq(mut self, seq: Seq) -> Self {
		self.seq = Some(seq);
		self
	}

	/// Sort key for the canonical order defined in spec §9: `seq` ascending
	/// when present, else `timestamp` ascending, tiebreak `id`.
	///
	/// `seq` and timestamp-only entries are never compared against each
	/// other directly by this key alone; see [`canonical_order`] for the
	/// full comparator, which this key backs.
	fn order_key(&self) -> (Option<u64>, i64, &str) {
		(self.seq.map(|s| s.0), self.timestamp.millis(), self.id.as_str())
	}
}

/// Compare two entries under the canonical order (spec §4.7, §9).
///
/// Entries carrying `seq` sort before those without it whenever both are
/// present in the same comparison; within a `seq`-having group, `seq` is
/// the primary key. Timestamp is the fallback, id the final tiebreak. This
/// keeps ties stable across replicas (spec §9: "ties are broken by id").
pub fn compare_canonical(a: &Entry, b: &Entry) -> std::cmp::Ordering {
	match (a.seq, b.seq) {
		(Some(sa), Some(sb)) => sa.cmp(&sb).then_with(|| a.id.as_str().cmp(b.id.as_str())),
		(Some(_), None) => std::cmp::Ordering::Less,
		(None, Some(_)) => std::cmp::Ordering::Greater,
		(None, None) => a
			.timestamp
			.cmp(&b.timestamp)
			.then_with(|| a.id.as_str().cmp(b.id.as_str())),
	}
}

/// Sort a slice of entries into canonical order in place.
pub fn sort_canonical(entries: &mut [Entry]) {
	entries.sort_by(compare_canonical);
}

#[cfg(test)]
mod tests {
	use super::*;

	fn e(id: &str, ts: i64, seq: Option<u64>) -> Entry {
		let mut entry = Entry::new(id, "x", Timestamp::from_millis(ts));
		entry.seq = seq.map(Seq);
		entry
	}

	#[test]
	fn timestamp_orders_when_no_seq() {
		let mut v = vec![e("b", 2, None), e("a", 1, None)];
		sort_canonical(&mut v);
		assert_eq!(v[0].id.as_str(), "a");
		assert_eq!(v[1].id.as_str(), "b");
	}

	#[test]
	fn seq_takes_priority_over_timestamp() {
		let mut v = vec![e("a", 100, Some(2)), e("b", 1, Some(1))];
		sort_canonical(&mut v);
		assert_eq!(v[0].id.as_str(), "b");
		assert_eq!(v[1].id.as_str(), "a");
	}

	#[test]
	fn ties_break_on_id() {
		let mut v = vec![e("z", 5, None), e("a", 5, None)];
		sort_canonical(&mut v);
		assert_eq!(v[0].id.as_str(), "a");
	}

	#[test]
	fn seq_having_entries_sort_before_seq_less_entries() {
		let mut v = vec![e("no-seq", 1, None), e("has-seq", 1_000_000, Some(1))];
		sort_canonical(&mut v);
		assert_eq!(v[0].id.as_str(), "has-seq");
	}
}

// vim: ts=4
