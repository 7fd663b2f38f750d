//! SLM client for an OpenAI-compatible chat-completions endpoint
//!
//! Targets a llama.cpp / Ollama / vLLM style server. Every request forces
//! tool choice (`tool_choice: "required"`), pins temperature to 0 for
//! reproducibility and disables thinking-trace emission. Responses are
//! parsed in layered precedence: structured `tool_calls` first, then a
//! JSON object in the plain content, then an [`CompletionOutcome::Unparsed`]
//! value carrying the raw response.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use hearth_core::{history_to_wire, tool_catalog, ConversationTurn, Error, FunctionCall, Result};

use crate::backend::{Completion, CompletionBackend, CompletionOutcome};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_API_KEY: &str = "EMPTY";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Fixed task framing prepended to every transcript. Directs the model to
/// emit exactly one tool call per turn and to omit, not invent, arguments
/// it cannot determine.
const SYSTEM_PROMPT: &str = "You are a tool-calling model working on:\n\
<task_description>You are an on-device smart home controller. \
Given a natural language command from the user, call the appropriate \
smart home function. If the user does not specify a required value \
(e.g. which room or what temperature), omit that parameter from the \
function call. Maintain context across conversation turns to resolve \
pronouns and sequential commands.</task_description>\n\n\
Respond to the conversation history by generating an appropriate tool call that \
satisfies the user request. Generate only the tool call according to the provided \
tool schema, do not generate anything else. Always respond with a tool call.\n\n";

/// Client configuration for the completion endpoint.
#[derive(Debug, Clone)]
pub struct SlmConfig {
    pub model: String,
    pub host: String,
    pub port: u16,
    pub api_key: String,
}

impl SlmConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: DEFAULT_API_KEY.to_string(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }
}

/// Stateless client for the chat-completions endpoint.
pub struct SlmClient {
    client: Client,
    config: SlmConfig,
}

impl SlmClient {
    pub fn new(config: SlmConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn completions_url(&self) -> String {
        format!(
            "http://{}:{}/v1/chat/completions",
            self.config.host, self.config.port
        )
    }

    fn build_body(&self, history: &[ConversationTurn]) -> Value {
        let mut messages = vec![json!({"role": "system", "content": SYSTEM_PROMPT})];
        messages.extend(history_to_wire(history));

        json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": 0,
            "tools": tool_catalog(),
            "tool_choice": "required",
            "chat_template_kwargs": {"enable_thinking": false},
        })
    }
}

#[async_trait::async_trait]
impl CompletionBackend for SlmClient {
    async fn invoke(&self, history: &[ConversationTurn]) -> Result<Completion> {
        let url = self.completions_url();
        let body = self.build_body(history);

        debug!(model = %self.config.model, turns = history.len(), "sending completion request");

        // Latency covers the network round-trip only, not parsing.
        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        if !status.is_success() {
            return Err(Error::endpoint(status.as_u16(), text));
        }

        let parsed: Value = serde_json::from_str(&text)?;
        let message = parsed
            .pointer("/choices/0/message")
            .cloned()
            .unwrap_or(Value::Null);

        let outcome = parse_outcome(&message);
        if let CompletionOutcome::Unparsed(ref raw) = outcome {
            warn!(latency_ms, "completion had no parseable tool call: {}", raw);
        }

        Ok(Completion {
            outcome,
            latency_ms,
        })
    }
}

/// Parse a response message into an outcome. Layered precedence, first
/// success wins; never an error.
pub fn parse_outcome(message: &Value) -> CompletionOutcome {
    if let Some(call) = parse_structured_tool_call(message) {
        return CompletionOutcome::Call(call);
    }
    if let Some(call) = parse_content_json(message) {
        return CompletionOutcome::Call(call);
    }
    CompletionOutcome::Unparsed(format!(
        "No valid tool call in model response, model returned {}",
        message
    ))
}

/// Path A: a proper `tool_calls` entry on the message.
fn parse_structured_tool_call(message: &Value) -> Option<FunctionCall> {
    let function = message.pointer("/tool_calls/0/function")?;
    let name = function.get("name")?.as_str()?.to_string();
    let arguments = decode_arguments(function.get("arguments"))?;
    Some(FunctionCall::new(name, arguments))
}

/// Path B: the content field holds a JSON object `{name, arguments}`
/// (`parameters` accepted as an alias).
fn parse_content_json(message: &Value) -> Option<FunctionCall> {
    let content = message.get("content")?.as_str()?;
    let parsed: Value = serde_json::from_str(content.trim()).ok()?;
    let name = parsed.get("name")?.as_str()?.to_string();
    let raw = parsed
        .get("arguments")
        .or_else(|| parsed.get("parameters"));
    let arguments = decode_arguments(raw)?;
    Some(FunctionCall::new(name, arguments))
}

/// Argument payloads arrive either as an object or as a JSON-encoded
/// string; decode once. Absent or null means no arguments were given.
fn decode_arguments(raw: Option<&Value>) -> Option<Map<String, Value>> {
    match raw {
        None | Some(Value::Null) => Some(Map::new()),
        Some(Value::Object(map)) => Some(map.clone()),
        Some(Value::String(s)) => serde_json::from_str::<Value>(s)
            .ok()?
            .as_object()
            .cloned(),
        Some(_) => None,
    }
}
