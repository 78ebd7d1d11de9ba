//! `JournalDocument`: the replicated CRDT container (spec §3, §4.1, C1).
//!
//! Named sub-collections live as top-level shared types on a single
//! `yrs::Doc`, following the same `get_or_insert_*` + typed-wrapper shape
//! diaryx's `BodyDoc` uses for its text/frontmatter pair, generalized here
//! to six sub-collections instead of two.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use dashmap::DashMap;
use journal_types::{Fingerprint, JournalError, JournalResult};
use tokio::sync::broadcast;
use yrs::updates::decoder::Decode;
use yrs::updates::encoder::Encode;
use yrs::{Doc, MapRef, ReadTxn, StateVector, Transact, Update};

use crate::subcollection::{ChangeEvent, ChangeOrigin, SubCollection};
use crate::summaries::SummaryRecord;

pub(crate) const SUMMARY_RECORD_CHANNEL_CAPACITY: usize = 1;

type Listener = Box<dyn Fn(ChangeEvent) + Send + Sync>;

/// The replicated document: a `yrs::Doc` plus the six named sub-collections
/// defined in spec §3, an in-process observer registry, and the pending
/// `acquireBuild` tickets for the Summary Cache (C4).
pub struct JournalDocument {
	pub(crate) doc: Doc,
	pub(crate) character: MapRef,
	pub(crate) journal: yrs::ArrayRef,
	pub(crate) settings: MapRef,
	pub(crate) summaries: MapRef,
	pub(crate) chronicle: MapRef,
	pub(crate) questions_cache: MapRef,

	listeners: RwLock<Vec<(u64, Listener)>>,
	next_listener_id: AtomicU64,
	next_seq: AtomicU64,

	pub(crate) pending_builds: DashMap<Fingerprint, broadcast::Sender<Option<SummaryRecord>>>,
}

/// An active `observe` registration. Dropping it does not unregister; call
/// [`Subscription::unregister`] explicitly (spec §4.1: "returns an
/// unregister function").
#[must_use = "dropping a Subscription does not unregister its listener"]
pub struct Subscription {
	id: u64,
}

impl Subscription {
	pub fn unregister(self, doc: &JournalDocument) {
		doc.remove_listener(self.id);
	}
}

impl JournalDocument {
	/// Create a fresh, empty document and register all six sub-collections.
	pub fn new() -> Self {
		let doc = Doc::new();
		let character = doc.get_or_insert_map(SubCollection::Character.type_name());
		let journal = doc.get_or_insert_array(SubCollection::Journal.type_name());
		let settings = doc.get_or_insert_map(SubCollection::Settings.type_name());
		let summaries = doc.get_or_insert_map(SubCollection::Summaries.type_name());
		let chronicle = doc.get_or_insert_map(SubCollection::Chronicle.type_name());
		let questions_cache = doc.get_or_insert_map(SubCollection::QuestionsCache.type_name());

		Self {
			doc,
			character,
			journal,
			settings,
			summaries,
			chronicle,
			questions_cache,
			listeners: RwLock::new(Vec::new()),
			next_listener_id: AtomicU64::new(0),
			next_seq: AtomicU64::new(0),
			pending_builds: DashMap::new(),
		}
	}

	/// Rehydrate a document from a previously encoded full state (spec §4.2:
	/// "begin local hydration immediately").
	pub fn from_update(update: &[u8]) -> JournalResult<Self> {
		let me = Self::new();
		me.apply_update(update)?;
		Ok(me)
	}

	/// Apply a binary update received from local storage or a relay peer.
	///
	/// A binary CRDT update doesn't cheaply reveal which sub-collection(s)
	/// it touched, so this notifies every sub-collection as
	/// [`ChangeOrigin::Remote`] rather than none at all — every listener in
	/// this codebase already treats re-evaluation of an unchanged
	/// sub-collection as a no-op, so over-notifying is harmless and
	/// under-notifying would silently break reactivity to remote changes.
	///
	/// Also recomputes `next_seq` unconditionally: a remote update may carry
	/// entries with a higher `seq` than anything this replica has assigned
	/// locally, and the next local append must not collide with it.
	pub fn apply_update(&self, update: &[u8]) -> JournalResult<()> {
		let decoded = Update::decode_v1(update)
			.map_err(|e| JournalError::ParseError(format!("crdt update: {e}")))?;
		{
			let mut txn = self.doc.transact_mut();
			txn.apply_update(decoded)
				.map_err(|e| JournalError::ParseError(format!("apply crdt update: {e}")))?;
		}
		self.recompute_next_seq();
		for collection in [
			SubCollection::Character,
			SubCollection::Journal,
			SubCollection::Settings,
			SubCollection::Summaries,
			SubCollection::Chronicle,
			SubCollection::QuestionsCache,
		] {
			self.notify(collection, ChangeOrigin::Remote);
		}
		Ok(())
	}

	/// Encode the full current state vector (spec §4.1 sync primitives).
	pub fn encode_state_vector(&self) -> Vec<u8> {
		let txn = self.doc.transact();
		txn.state_vector().encode_v1()
	}

	/// Encode the full state as a single update, suitable for cold start.
	pub fn encode_state_as_update(&self) -> Vec<u8> {
		let txn = self.doc.transact();
		txn.encode_state_as_update_v1(&StateVector::default())
	}

	/// Encode only what a peer at `remote_sv` is missing.
	pub fn encode_diff(&self, remote_sv: &[u8]) -> JournalResult<Vec<u8>> {
		let sv = StateVector::decode_v1(remote_sv)
			.map_err(|e| JournalError::ParseError(format!("state vector: {e}")))?;
		let txn = self.doc.transact();
		Ok(txn.encode_state_as_update_v1(&sv))
	}

	/// Register a listener for a sub-collection (spec §4.1 `observe`).
	///
	/// The returned [`Subscription`] must be unregistered explicitly;
	/// listeners MUST NOT block and MUST be safe to invoke re-entrantly.
	pub fn observe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(ChangeEvent) + Send + Sync + 'static,
	{
		let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
		self.listeners.write().unwrap_or_else(|e| e.into_inner()).push((id, Box::new(listener)));
		Subscription { id }
	}

	fn remove_listener(&self, id: u64) {
		let mut guard = self.listeners.write().unwrap_or_else(|e| e.into_inner());
		guard.retain(|(listener_id, _)| *listener_id != id);
	}

	/// Invoked by every mutation helper after it commits. Fires listeners
	/// serially, in registration order, per spec §5's scheduling guarantee.
	pub(crate) fn notify(&self, collection: SubCollection, origin: ChangeOrigin) {
		let event = ChangeEvent { collection, origin };
		let guard = self.listeners.read().unwrap_or_else(|e| e.into_inner());
		for (_, listener) in guard.iter() {
			listener(event);
		}
	}

	/// Allocate the next per-replica monotonic `seq` (spec §3: "seq ...
	/// monotonically increasing within a single replica's view").
	pub(crate) fn next_seq(&self) -> u64 {
		self.next_seq.fetch_add(1, Ordering::Relaxed)
	}

	/// Recompute `next_seq` from the current journal contents, so the next
	/// locally-assigned `seq` never collides with one already present.
	/// [`Self::apply_update`] already calls this after every applied
	/// update; exposed as `pub` for any caller that needs to force a
	/// recompute directly.
	pub fn recompute_next_seq(&self) {
		let highest = self.journal_list().into_iter().filter_map(|e| e.seq).map(|s| s.0).max();
		if let Some(highest) = highest {
			self.next_seq.store(highest + 1, Ordering::Relaxed);
		}
	}
}

impl Default for JournalDocument {
	fn default() -> Self {
		Self::new()
	}
}

// vim: ts=4
