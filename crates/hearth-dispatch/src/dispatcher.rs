//! Action dispatcher
//!
//! Delivers validated function calls to the home-control webhook as JSON
//! payloads with a fresh correlation id per logical dispatch. Transient
//! failures (transport faults, 5xx) are retried a bounded number of times
//! with the same correlation id; 4xx rejections terminate immediately.
//! Ordinary failure is a result value, never an error.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_WEBHOOK_URL: &str = "https://jsonplaceholder.typicode.com/posts";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_RETRIES: u32 = 2;
const BACKOFF_STEP: Duration = Duration::from_millis(250);
const DEFAULT_MESSAGE: &str = "Action accepted";

/// Uniform outcome of one dispatched action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionExecutionResult {
    pub ok: bool,
    pub status_code: Option<u16>,
    pub message: String,
    /// Correlation id: fresh per logical dispatch, stable across retries.
    pub request_id: String,
    /// Decoded response body, or the literal text for non-JSON bodies.
    pub raw_response: Option<Value>,
}

/// Delivery seam the orchestrator dispatches through; test fakes record
/// calls instead of performing HTTP.
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn dispatch(&self, action: &str, arguments: &Map<String, Value>)
        -> ActionExecutionResult;
}

/// HTTP dispatcher posting to a webhook endpoint.
pub struct ActionDispatcher {
    client: Client,
    webhook_url: String,
}

impl ActionDispatcher {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            webhook_url: webhook_url.into(),
        }
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_WEBHOOK_URL)
    }
}

#[async_trait]
impl ActionSink for ActionDispatcher {
    async fn dispatch(
        &self,
        action: &str,
        arguments: &Map<String, Value>,
    ) -> ActionExecutionResult {
        let request_id = Uuid::new_v4().to_string();
        let payload = build_payload(action, arguments, &request_id);
        let mut last_error = String::from("unknown_error");

        for attempt in 1..=MAX_RETRIES + 1 {
            debug!(%request_id, attempt, action, endpoint = %self.webhook_url, "dispatching action");

            match self.client.post(&self.webhook_url).json(&payload).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let text = response.text().await.unwrap_or_default();
                    let body = decode_body(text);

                    if (200..300).contains(&status) {
                        debug!(%request_id, status, "action accepted");
                        return ActionExecutionResult {
                            ok: true,
                            status_code: Some(status),
                            message: success_message(&body),
                            request_id,
                            raw_response: Some(body),
                        };
                    }

                    // Retry only on transient server-side errors.
                    last_error = format!("HTTP {}", status);
                    let should_retry = status >= 500 && attempt <= MAX_RETRIES;
                    debug!(%request_id, status, retry = should_retry, "webhook rejected action");
                    if !should_retry {
                        return ActionExecutionResult {
                            ok: false,
                            status_code: Some(status),
                            message: last_error,
                            request_id,
                            raw_response: Some(body),
                        };
                    }
                }
                Err(err) => {
                    last_error = err.to_string();
                    let should_retry = attempt <= MAX_RETRIES;
                    warn!(%request_id, error = %last_error, retry = should_retry, "webhook transport failure");
                    if !should_retry {
                        break;
                    }
                }
            }

            // Linear backoff; retry volume is small and bounded.
            tokio::time::sleep(BACKOFF_STEP * attempt).await;
        }

        ActionExecutionResult {
            ok: false,
            status_code: None,
            message: last_error,
            request_id,
            raw_response: None,
        }
    }
}

fn build_payload(action: &str, arguments: &Map<String, Value>, request_id: &str) -> Value {
    json!({
        "action": action,
        "arguments": arguments,
        "request_id": request_id,
        "timestamp": Utc::now().to_rfc3339(),
    })
}

fn decode_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// Message for a 2xx response: the body's `message` field, else `title`,
/// else a default; non-JSON bodies contribute their first 200 characters.
fn success_message(body: &Value) -> String {
    match body {
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("title"))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
        Value::String(s) if !s.trim().is_empty() => s.trim().chars().take(200).collect(),
        _ => DEFAULT_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct StubState {
        /// Status codes to answer with, in order; the last one repeats.
        statuses: Arc<Mutex<VecDeque<u16>>>,
        payloads: Arc<Mutex<Vec<Value>>>,
        body: Option<Value>,
    }

    async fn hook(State(state): State<StubState>, Json(payload): Json<Value>) -> (StatusCode, Json<Value>) {
        state.payloads.lock().unwrap().push(payload);
        let status = {
            let mut statuses = state.statuses.lock().unwrap();
            if statuses.len() > 1 {
                statuses.pop_front().unwrap()
            } else {
                statuses.front().copied().unwrap_or(200)
            }
        };
        let body = state.body.clone().unwrap_or_else(|| json!({}));
        (StatusCode::from_u16(status).unwrap(), Json(body))
    }

    /// Spin up an in-process webhook stub; returns its URL and state.
    async fn stub_webhook(statuses: &[u16], body: Option<Value>) -> (String, StubState) {
        let state = StubState {
            statuses: Arc::new(Mutex::new(statuses.iter().copied().collect())),
            payloads: Arc::new(Mutex::new(Vec::new())),
            body,
        };
        let app = Router::new()
            .route("/hook", post(hook))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/hook", addr), state)
    }

    fn lights_args() -> Map<String, Value> {
        let mut args = Map::new();
        args.insert("room".into(), json!("kitchen"));
        args.insert("state".into(), json!("on"));
        args
    }

    #[test]
    fn payload_carries_action_arguments_id_and_timestamp() {
        let payload = build_payload("toggle_lights", &lights_args(), "req-1");
        assert_eq!(payload["action"], "toggle_lights");
        assert_eq!(payload["arguments"]["room"], "kitchen");
        assert_eq!(payload["request_id"], "req-1");
        assert!(payload["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn success_message_precedence() {
        assert_eq!(success_message(&json!({"message": "done", "title": "t"})), "done");
        assert_eq!(success_message(&json!({"title": "created"})), "created");
        assert_eq!(success_message(&json!({"id": 101})), DEFAULT_MESSAGE);
        assert_eq!(success_message(&json!({"message": 7})), "7");
        assert_eq!(success_message(&Value::String("  plain ack  ".into())), "plain ack");
        assert_eq!(success_message(&Value::String("   ".into())), DEFAULT_MESSAGE);
        let long = "x".repeat(300);
        assert_eq!(success_message(&Value::String(long)).len(), 200);
    }

    #[tokio::test]
    async fn two_hundred_is_success_with_extracted_message() {
        let (url, state) = stub_webhook(&[201], Some(json!({"title": "queued"}))).await;
        let dispatcher = ActionDispatcher::new(url);

        let result = dispatcher.dispatch("set_scene", &lights_args()).await;
        assert!(result.ok);
        assert_eq!(result.status_code, Some(201));
        assert_eq!(result.message, "queued");
        assert_eq!(result.raw_response, Some(json!({"title": "queued"})));
        assert_eq!(state.payloads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn permanent_500_attempts_exactly_three_times() {
        let (url, state) = stub_webhook(&[500], None).await;
        let dispatcher = ActionDispatcher::new(url);

        let result = dispatcher.dispatch("toggle_lights", &lights_args()).await;
        assert!(!result.ok);
        assert_eq!(result.status_code, Some(500));
        assert_eq!(result.message, "HTTP 500");
        assert_eq!(state.payloads.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn four_oh_four_fails_immediately_without_retry() {
        let (url, state) = stub_webhook(&[404], None).await;
        let dispatcher = ActionDispatcher::new(url);

        let result = dispatcher.dispatch("toggle_lights", &lights_args()).await;
        assert!(!result.ok);
        assert_eq!(result.status_code, Some(404));
        assert_eq!(result.message, "HTTP 404");
        assert_eq!(state.payloads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn request_id_stable_across_retries_distinct_across_dispatches() {
        let (url, state) = stub_webhook(&[500, 500, 200], None).await;
        let dispatcher = ActionDispatcher::new(url);

        let first = dispatcher.dispatch("lock_door", &lights_args()).await;
        assert!(first.ok);

        let ids: Vec<String> = state
            .payloads
            .lock()
            .unwrap()
            .iter()
            .map(|p| p["request_id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|id| id == &ids[0]));

        let second = dispatcher.dispatch("lock_door", &lights_args()).await;
        assert_ne!(second.request_id, first.request_id);
    }

    #[tokio::test]
    async fn transport_failure_exhausts_with_null_status() {
        // Nothing listens here; connection is refused on every attempt.
        let dispatcher = ActionDispatcher::new("http://127.0.0.1:9/hook");

        let result = dispatcher.dispatch("toggle_lights", &lights_args()).await;
        assert!(!result.ok);
        assert_eq!(result.status_code, None);
        assert!(result.raw_response.is_none());
        assert!(!result.message.is_empty());
    }
}
