use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use journal_store::SummaryContent;
use journal_types::{JournalError, JournalResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const KEY_PREFIX: &str = "sk-";

const QUESTIONS_MAX_TOKENS: u32 = 1200;
const QUESTIONS_TEMPERATURE: f32 = 0.8;
const SUMMARY_MAX_TOKENS: u32 = 400;
const SUMMARY_TEMPERATURE: f32 = 0.3;

const STRUCTURED_SUMMARY_SYSTEM_PROMPT: &str = "Respond with a single JSON object \
	shaped exactly {\"title\": string, \"subtitle\": string, \"summary\": string}. \
	No prose outside the JSON object.";

fn key_is_valid(api_key: &str) -> bool {
	!api_key.is_empty() && api_key.starts_with(KEY_PREFIX)
}

/// `isAvailable()` (spec §4.5): true iff `ai-enabled` is set and the key is
/// non-empty and matches the recognized prefix (spec §6: `sk-`). The
/// `ai-enabled` flag lives in the Settings Projection, not here, so callers
/// pass it in explicitly.
pub fn is_available(ai_enabled: bool, api_key: &str) -> bool {
	ai_enabled && key_is_valid(api_key)
}

/// Per-call overrides. Callers normally use [`LlmGateway::call_questions`]/
/// [`LlmGateway::call_summary`], which already carry spec-recommended
/// defaults; this is exposed for callers that need to deviate.
#[derive(Clone, Copy, Debug)]
pub struct CallOptions {
	pub max_tokens: u32,
	pub temperature: f32,
}

/// Gateway configuration. Stateless beyond this: no request carries
/// cross-call state (spec §4.5: "Stateless adapter").
#[derive(Clone, Debug)]
pub struct GatewayConfig {
	pub api_key: String,
	pub model: String,
	pub endpoint: String,
	pub timeout: Duration,
}

impl GatewayConfig {
	pub fn new(api_key: impl Into<String>) -> Self {
		Self {
			api_key: api_key.into(),
			model: DEFAULT_MODEL.to_string(),
			endpoint: DEFAULT_ENDPOINT.to_string(),
			timeout: DEFAULT_TIMEOUT,
		}
	}
}

#[derive(Serialize)]
struct ChatMessage<'a> {
	role: &'a str,
	content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
	model: &'a str,
	messages: Vec<ChatMessage<'a>>,
	max_tokens: u32,
	temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
	choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
	message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
	content: String,
}

#[derive(Deserialize)]
struct StructuredSummaryBody {
	title: String,
	subtitle: String,
	summary: String,
}

/// Stateless adapter over an OpenAI-compatible chat-completion endpoint
/// (spec §4.5, C5). No retries: callers decide (spec §4.5).
pub struct LlmGateway {
	client: Client<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>, Full<Bytes>>,
	config: GatewayConfig,
}

impl LlmGateway {
	pub fn new(config: GatewayConfig) -> JournalResult<Self> {
		let connector = HttpsConnectorBuilder::new()
			.with_native_roots()
			.map_err(|e| JournalError::NetworkError(format!("TLS setup: {e}")))?
			.https_only()
			.enable_http1()
			.enable_http2()
			.build();
		let client = Client::builder(TokioExecutor::new()).build(connector);
		Ok(Self { client, config })
	}

	/// Whether this gateway's configured key has the recognized shape. The
	/// `ai-enabled` master switch is the caller's concern (spec §4.3); a
	/// pipeline should gate on [`is_available`] before reaching this far.
	pub fn has_valid_key(&self) -> bool {
		key_is_valid(&self.config.api_key)
	}

	/// `callQuestions(systemPrompt, userPrompt, {maxTokens≈1200, temperature≈0.8})`.
	pub async fn call_questions(&self, system_prompt: &str, user_prompt: &str) -> JournalResult<String> {
		self.call_with(
			Some(system_prompt),
			user_prompt,
			CallOptions { max_tokens: QUESTIONS_MAX_TOKENS, temperature: QUESTIONS_TEMPERATURE },
		)
		.await
	}

	/// `callSummary(userPrompt, {maxTokens≈400, temperature≈0.3})`.
	pub async fn call_summary(&self, user_prompt: &str) -> JournalResult<String> {
		self.call_with(
			None,
			user_prompt,
			CallOptions { max_tokens: SUMMARY_MAX_TOKENS, temperature: SUMMARY_TEMPERATURE },
		)
		.await
	}

	/// `callStructuredEntrySummary(content)` → `{title, subtitle, summary}`
	/// parsed from model output (spec §4.5).
	pub async fn call_structured_entry_summary(&self, content: &str) -> JournalResult<SummaryContent> {
		let raw = self
			.call_with(
				Some(STRUCTURED_SUMMARY_SYSTEM_PROMPT),
				content,
				CallOptions { max_tokens: SUMMARY_MAX_TOKENS, temperature: SUMMARY_TEMPERATURE },
			)
			.await?;

		let parsed: StructuredSummaryBody = serde_json::from_str(raw.trim())
			.map_err(|e| JournalError::ParseError(format!("structured entry summary: {e}")))?;

		Ok(SummaryContent::Structured {
			title: parsed.title,
			subtitle: parsed.subtitle,
			summary: parsed.summary,
		})
	}

	async fn call_with(&self, system_prompt: Option<&str>, user_prompt: &str, opts: CallOptions) -> JournalResult<String> {
		if !self.has_valid_key() {
			return Err(JournalError::AIUnavailable);
		}

		let mut messages = Vec::with_capacity(2);
		if let Some(system) = system_prompt {
			messages.push(ChatMessage { role: "system", content: system });
		}
		messages.push(ChatMessage { role: "user", content: user_prompt });

		let request_body = ChatRequest {
			model: &self.config.model,
			messages,
			max_tokens: opts.max_tokens,
			temperature: opts.temperature,
		};

		let body = serde_json::to_vec(&request_body)
			.map_err(|e| JournalError::ParseError(format!("encode chat request: {e}")))?;

		let request = hyper::Request::builder()
			.method(hyper::Method::POST)
			.uri(&self.config.endpoint)
			.header("Content-Type", "application/json")
			.header("Authorization", format!("Bearer {}", self.config.api_key))
			.body(Full::new(Bytes::from(body)))
			.map_err(|e| JournalError::NetworkError(format!("build request: {e}")))?;

		let response = match tokio::time::timeout(self.config.timeout, self.client.request(request)).await {
			Ok(Ok(response)) => response,
			Ok(Err(e)) => return Err(JournalError::NetworkError(e.to_string())),
			Err(_) => return Err(JournalError::TimeoutError),
		};

		let status = response.status();
		let body_bytes = response
			.into_body()
			.collect()
			.await
			.map_err(|e| JournalError::NetworkError(format!("read response body: {e}")))?
			.to_bytes();

		if !status.is_success() {
			let message = std::str::from_utf8(&body_bytes).unwrap_or("").to_string();
			if status.is_server_error() {
				warn!(%status, "LLM endpoint returned server error");
				return Err(JournalError::HTTPError { status: status.as_u16() });
			}
			debug!(%status, "LLM endpoint returned provider error");
			return Err(JournalError::ProviderError(if message.is_empty() { status.to_string() } else { message }));
		}

		let parsed: ChatResponse = serde_json::from_slice(&body_bytes)
			.map_err(|e| JournalError::ParseError(format!("decode chat response: {e}")))?;

		parsed
			.choices
			.into_iter()
			.next()
			.map(|choice| choice.message.content)
			.ok_or_else(|| JournalError::ParseError("empty choices array".to_string()))
	}
}


// vim: ts=4
