//! Epoch-millisecond timestamps.
//!
//! Entries are author-local and may be non-monotonic across replicas
//! (spec §3); this type carries no ordering guarantee beyond `Ord` on the
//! raw value.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
		Timestamp(since_epoch.as_millis() as i64)
	}

	pub fn from_millis(millis: i64) -> Timestamp {
		Timestamp(millis)
	}

	pub fn millis(&self) -> i64 {
		self.0
	}

	/// Whole seconds elapsed since this timestamp until now, saturating at 0.
	pub fn elapsed_secs(&self) -> i64 {
		(Timestamp::now().0 - self.0).max(0) / 1000
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl PartialEq for Timestamp {
	fn eq(&self, other: &Self) -> bool {
		self.0 == other.0
	}
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Timestamp {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.0.cmp(&other.0)
	}
}

// vim: ts=4
