//! Relay sync client (spec §4.2: "establish a relay connection").
//!
//! Grounded on a split-sink/split-stream `tokio::select!` loop and a
//! `[msg_type: u8][payload]` binary framing (`msg_type = 0` is the
//! sync/update channel; reused verbatim here so a relay speaking that
//! protocol needs no client-specific dialect). Built on `tokio-tungstenite`
//! for the client side (see `DESIGN.md`).

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use journal_types::{JournalError, JournalResult};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::tungstenite::Message;

const MSG_TYPE_SYNC: u8 = 0;
const RECONNECT_BACKOFF: Duration = Duration::from_secs(3);
const INBOUND_CHANNEL_CAPACITY: usize = 256;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Observable connection state (spec §4.2: "surface a connection state").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionState {
	/// No `sync-server-url` configured, or it was cleared.
	LocalOnly,
	Connecting,
	Connected,
	/// Last attempt failed; will retry after a backoff.
	Failed,
}

/// Client side of the relay protocol. Reconnects automatically whenever the
/// target URL changes (spec §4.3: "writes to `sync-server-url` MUST notify
/// C2 to reconnect").
pub struct RelayClient {
	url_tx: watch::Sender<Option<String>>,
	state_rx: watch::Receiver<ConnectionState>,
	outbound_tx: mpsc::UnboundedSender<Vec<u8>>,
	inbound_tx: broadcast::Sender<Vec<u8>>,
}

impl RelayClient {
	pub fn new() -> Self {
		let (url_tx, url_rx) = watch::channel(None);
		let (state_tx, state_rx) = watch::channel(ConnectionState::LocalOnly);
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let (inbound_tx, _) = broadcast::channel(INBOUND_CHANNEL_CAPACITY);

		tokio::spawn(run_loop(url_rx, state_tx, outbound_rx, inbound_tx.clone()));

		Self { url_tx, state_rx, outbound_tx, inbound_tx }
	}

	/// Validate and apply a new `sync-server-url` value. An empty string
	/// disconnects and returns to local-only mode (spec §4.3 default `""`).
	pub fn set_sync_url(&self, raw: &str) -> JournalResult<()> {
		if raw.is_empty() {
			let _ = self.url_tx.send(None);
			return Ok(());
		}
		let parsed = url::Url::parse(raw).map_err(|_| JournalError::InvalidSyncURL(raw.to_string()))?;
		if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
			return Err(JournalError::InvalidSyncURL(raw.to_string()));
		}
		let _ = self.url_tx.send(Some(raw.to_string()));
		Ok(())
	}

	/// Queue a local update for delivery to the relay. No-op (silently
	/// dropped) while in `LocalOnly` mode, per spec §4.2's "retain
	/// local-only mode" tolerance.
	pub fn send_update(&self, bytes: Vec<u8>) {
		let _ = self.outbound_tx.send(bytes);
	}

	/// Subscribe to updates received from the relay.
	pub fn subscribe_inbound(&self) -> broadcast::Receiver<Vec<u8>> {
		self.inbound_tx.subscribe()
	}

	pub fn state(&self) -> ConnectionState {
		*self.state_rx.borrow()
	}

	pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
		self.state_rx.clone()
	}
}

impl Default for RelayClient {
	fn default() -> Self {
		Self::new()
	}
}

async fn run_loop(
	mut url_rx: watch::Receiver<Option<String>>,
	state_tx: watch::Sender<ConnectionState>,
	mut outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
	inbound_tx: broadcast::Sender<Vec<u8>>,
) {
	loop {
		let Some(url) = url_rx.borrow_and_update().clone() else {
			let _ = state_tx.send(ConnectionState::LocalOnly);
			if url_rx.changed().await.is_err() {
				return;
			}
			continue;
		};

		let _ = state_tx.send(ConnectionState::Connecting);
		match tokio::time::timeout(CONNECT_TIMEOUT, tokio_tungstenite::connect_async(url.as_str())).await {
			Ok(Ok((stream, _response))) => {
				let _ = state_tx.send(ConnectionState::Connected);
				let (mut sink, mut source) = stream.split();

				loop {
					tokio::select! {
						changed = url_rx.changed() => {
							if changed.is_err() {
								return;
							}
							break;
						}
						incoming = source.next() => {
							match incoming {
								Some(Ok(Message::Binary(data))) if !data.is_empty() && data[0] == MSG_TYPE_SYNC => {
									let _ = inbound_tx.send(data[1..].to_vec());
								}
								Some(Ok(_)) => continue,
								Some(Err(e)) => {
									tracing::warn!("relay connection error: {e}");
									break;
								}
								None => break,
							}
						}
						outgoing = outbound_rx.recv() => {
							match outgoing {
								Some(bytes) => {
									let mut framed = Vec::with_capacity(bytes.len() + 1);
									framed.push(MSG_TYPE_SYNC);
									framed.extend_from_slice(&bytes);
									if sink.send(Message::Binary(framed.into())).await.is_err() {
										break;
									}
								}
								None => return,
							}
						}
					}
				}
			}
			Ok(Err(e)) => {
				tracing::warn!("relay connect failed: {e}");
			}
			Err(_elapsed) => {
				tracing::warn!("relay connect timed out after {CONNECT_TIMEOUT:?}");
			}
		}

		let _ = state_tx.send(ConnectionState::Failed);
		tokio::select! {
			() = tokio::time::sleep(RECONNECT_BACKOFF) => {}
			changed = url_rx.changed() => {
				if changed.is_err() {
					return;
				}
			}
		}
	}
}


// vim: ts=4
