//! Error taxonomy for the journal core (spec §7).

use std::fmt;

pub type JournalResult<T> = Result<T, JournalError>;

/// Categorized errors surfaced by the core.
///
/// Pipeline steps (Parts Engine, per-entry summarization) swallow
/// `AIUnavailable` and the network variants rather than propagating them —
/// see spec §7's propagation policy. `NotInitialized` is always a
/// programmer error and must propagate.
#[derive(Debug)]
pub enum JournalError {
	/// Store accessed before `init()` completed.
	NotInitialized,

	/// `sync-server-url` is malformed or not a `ws`/`wss` URL.
	InvalidSyncURL(String),

	/// Local durable store could not be opened; core continues in-memory.
	PersistenceUnavailable(String),

	/// LLM Gateway not configured or disabled.
	AIUnavailable,

	/// Transport-level failure reaching the LLM endpoint.
	NetworkError(String),

	/// Non-2xx HTTP response from the LLM endpoint.
	HTTPError { status: u16 },

	/// Provider returned a well-formed error payload.
	ProviderError(String),

	/// The call exceeded its caller-imposed deadline.
	TimeoutError,

	/// Response body could not be parsed into the expected shape.
	ParseError(String),

	/// A cache record exists but fails a validity predicate.
	StaleCacheEntry(String),
}

impl fmt::Display for JournalError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			JournalError::NotInitialized => write!(f, "store accessed before init()"),
			JournalError::InvalidSyncURL(url) => write!(f, "invalid sync url: {url}"),
			JournalError::PersistenceUnavailable(msg) => {
				write!(f, "local persistence unavailable: {msg}")
			}
			JournalError::AIUnavailable => write!(f, "AI gateway unavailable"),
			JournalError::NetworkError(msg) => write!(f, "network error: {msg}"),
			JournalError::HTTPError { status } => write!(f, "HTTP error: {status}"),
			JournalError::ProviderError(msg) => write!(f, "provider error: {msg}"),
			JournalError::TimeoutError => write!(f, "request timed out"),
			JournalError::ParseError(msg) => write!(f, "parse error: {msg}"),
			JournalError::StaleCacheEntry(fp) => write!(f, "stale cache entry: {fp}"),
		}
	}
}

impl std::error::Error for JournalError {}

impl JournalError {
	/// True for the errors the pipeline is expected to swallow per spec §7.
	pub fn is_degraded_mode(&self) -> bool {
		matches!(
			self,
			JournalError::AIUnavailable
				| JournalError::NetworkError(_)
				| JournalError::TimeoutError
				| JournalError::HTTPError { .. }
		)
	}
}

// vim: ts=4
