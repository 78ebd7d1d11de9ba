//! Process-wide facade: owns the one replicated document this process
//! cares about, its local persistence, its relay connection and its
//! pipeline, and wires them together (spec §4.1-§4.9, §4.12, §9 "Global
//! mutable state").
//!
//! A single [`Journal`] handle is held in a module-scoped static,
//! initialized once by [`init`] and torn down by [`reset`] for tests —
//! the same shape `cloudillo`'s `App` handle takes, generalized from a
//! multi-tenant server process down to this crate's single in-process
//! document.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod config;

use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

pub use config::JournalConfig;
pub use journal_llm::{GatewayConfig, LlmGateway};
pub use journal_persist::{ConnectionState, DocMeta, PersistAdapter, RelayClient, StoredUpdate};
pub use journal_persist_redb::RedbPersistAdapter;
pub use journal_pipeline::{Orchestrator, PipelineConfig};
pub use journal_store::prelude::*;
pub use journal_types::prelude::*;

/// Bound on waiting for local hydration to finish (spec §4.2). Past this,
/// `init` proceeds with whatever's already applied rather than blocking the
/// caller indefinitely on a slow store.
const HYDRATION_TIMEOUT: Duration = Duration::from_secs(10);

static TRACING: std::sync::Once = std::sync::Once::new();
static HANDLE: OnceLock<Mutex<Option<Journal>>> = OnceLock::new();

/// Whether local hydration finished inside [`HYDRATION_TIMEOUT`] (spec §4.2:
/// "mark the store ready as soon as sub-collections are accessible").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PersistenceState {
	Active,
	/// Hydration timed out; the document is usable but may be missing
	/// updates still sitting in the local store.
	Unavailable,
}

/// Combined readiness signal (spec §4.2: "`{persistence: active|unavailable,
/// sync: ...}`").
#[derive(Clone, Copy, Debug)]
pub struct Readiness {
	pub persistence: PersistenceState,
	pub sync: ConnectionState,
}

fn init_tracing() {
	TRACING.call_once(|| {
		let _ = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).with_target(false).try_init();
	});
}

fn handle_slot() -> &'static Mutex<Option<Journal>> {
	HANDLE.get_or_init(|| Mutex::new(None))
}

/// The process-wide handle: the replicated document plus everything that
/// keeps it synchronized and summarized.
pub struct JournalState {
	pub doc: Arc<JournalDocument>,
	pub persist: Arc<RedbPersistAdapter>,
	pub relay: Arc<RelayClient>,
	pub gateway: Option<Arc<LlmGateway>>,
	pub config: JournalConfig,
	persistence_state: PersistenceState,
	_orchestrator: Orchestrator,
	_relay_forward: tokio::task::JoinHandle<()>,
}

impl JournalState {
	/// Current readiness signal (spec §4.2). `persistence` reflects whether
	/// hydration finished before [`HYDRATION_TIMEOUT`]; `sync` is the relay's
	/// live connection state.
	pub fn readiness(&self) -> Readiness {
		Readiness { persistence: self.persistence_state, sync: self.relay.state() }
	}
}

pub type Journal = Arc<JournalState>;

/// Initialize the process-wide handle (spec §4.1's `init()`). Hydrates
/// from local persistence by replaying its stored update log (spec §4.2:
/// "begin local hydration immediately"), bounded by [`HYDRATION_TIMEOUT`] so
/// a slow or stuck store degrades [`JournalState::readiness`] instead of
/// blocking this function forever. Connects the relay if `sync-server-url`
/// is already set and valid, and spawns the pipeline's [`Orchestrator`].
///
/// Fails outright (`JournalError::PersistenceUnavailable` and friends,
/// spec §7) only if the local store cannot be opened; a hydration read that
/// times out or errors is swallowed into [`PersistenceState::Unavailable`]
/// instead, same as an invalid stored sync URL staying local-only rather
/// than failing `init`.
pub async fn init(config: JournalConfig) -> JournalResult<Journal> {
	init_tracing();

	let persist = Arc::new(RedbPersistAdapter::open(&config.store_path).await?);

	// Sub-collections are accessible the moment `doc` exists; hydration only
	// replays what local persistence already has on top of that, so it's
	// bounded rather than allowed to block `init` indefinitely (spec §4.2).
	let doc = JournalDocument::new();
	let persistence_state = match tokio::time::timeout(HYDRATION_TIMEOUT, persist.get_updates()).await {
		Ok(Ok(stored)) => {
			for update in &stored {
				doc.apply_update(&update.data)?;
			}
			PersistenceState::Active
		}
		Ok(Err(e)) => {
			tracing::warn!("local hydration failed, continuing in degraded mode: {e}");
			PersistenceState::Unavailable
		}
		Err(_elapsed) => {
			tracing::warn!("local hydration exceeded {HYDRATION_TIMEOUT:?}, continuing in degraded mode");
			PersistenceState::Unavailable
		}
	};
	let doc = Arc::new(doc);

	let relay = Arc::new(RelayClient::new());
	let sync_url = doc.sync_server_url();
	if !sync_url.is_empty() {
		// Spec §4.2: a malformed stored sync URL retains local-only mode
		// rather than failing `init` outright.
		if let Err(e) = relay.set_sync_url(&sync_url) {
			tracing::warn!("stored sync-server-url is invalid, staying local-only: {e}");
		}
	}

	let gateway = {
		let key = doc.openai_api_key();
		if journal_llm::is_available(doc.ai_enabled(), &key) {
			Some(Arc::new(LlmGateway::new(GatewayConfig::new(key))?))
		} else {
			None
		}
	};

	let relay_forward = tokio::spawn(forward_relay_updates(doc.clone(), relay.clone()));
	spawn_sync_observer(&doc, persist.clone(), relay.clone());

	let pipeline_config = journal_pipeline::PipelineConfig::from(&config);
	let orchestrator = Orchestrator::spawn(doc.clone(), gateway.clone(), pipeline_config);

	let journal = Arc::new(JournalState {
		doc,
		persist,
		relay,
		gateway,
		config,
		persistence_state,
		_orchestrator: orchestrator,
		_relay_forward: relay_forward,
	});

	*handle_slot().lock().unwrap_or_else(|e| e.into_inner()) = Some(journal.clone());
	Ok(journal)
}

/// The current process-wide handle, if [`init`] has run.
pub fn current() -> Option<Journal> {
	handle_slot().lock().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Drop the process-wide handle (spec §9: "expose `reset()` for tests").
/// Does not delete persisted state; a fresh [`init`] against the same
/// store path picks up where this left off.
pub fn reset() {
	*handle_slot().lock().unwrap_or_else(|e| e.into_inner()) = None;
}

/// Persist and relay-forward local mutations, one sync-state-vector diff
/// per tick. Remote-originated changes are skipped to avoid echoing them
/// straight back out (spec §5 "transactional batching ... between two
/// observer ticks").
fn spawn_sync_observer(doc: &Arc<JournalDocument>, persist: Arc<RedbPersistAdapter>, relay: Arc<RelayClient>) {
	let last_sv = Mutex::new(doc.encode_state_vector());
	let doc_for_closure = doc.clone();
	let _subscription = doc.observe(move |event| {
		if event.origin != ChangeOrigin::Remote {
			let mut guard = last_sv.lock().unwrap_or_else(|e| e.into_inner());
			if let Ok(diff) = doc_for_closure.encode_diff(guard.as_slice()) {
				if !diff.is_empty() {
					let persist = persist.clone();
					let relay = relay.clone();
					let diff_for_relay = diff.clone();
					tokio::spawn(async move {
						let _ = persist.store_update(StoredUpdate::new(diff)).await;
					});
					relay.send_update(diff_for_relay);
				}
			}
			*guard = doc_for_closure.encode_state_vector();
		}
	});
}

/// Apply updates arriving from the relay to the local document (spec
/// §4.2). Tagged [`ChangeOrigin::Remote`] is implicit here: `apply_update`
/// itself carries no origin tag, so [`spawn_sync_observer`]'s diff loop
/// would otherwise re-broadcast a relay update right back to the relay —
/// avoided by only ever calling `apply_update` from this task, which never
/// touches `persist`/`relay` directly for what it just received.
async fn forward_relay_updates(doc: Arc<JournalDocument>, relay: Arc<RelayClient>) {
	let mut inbound = relay.subscribe_inbound();
	loop {
		match inbound.recv().await {
			Ok(bytes) => {
				let _ = doc.apply_update(&bytes);
			}
			Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
			Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
		}
	}
}

// vim: ts=4
