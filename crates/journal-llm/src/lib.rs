//! LLM Gateway (spec §4.5, C5): stateless adapter over an OpenAI-compatible
//! chat-completion HTTP endpoint.
//!
//! Grounded on `cloudillo-push/src/send.rs`'s hyper client shape (
//! `HttpsConnectorBuilder`, `hyper_util::client::legacy::Client`, status-code
//! to error-taxonomy mapping) — swapping VAPID/ECE push delivery for a JSON
//! chat-completion request/response.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod gateway;

pub use gateway::{is_available, CallOptions, GatewayConfig, LlmGateway};

// vim: ts=4
