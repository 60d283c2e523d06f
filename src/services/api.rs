//! Backend API client
//!
//! Blocking HTTP client meant to be driven from `RequestRunner` threads.
//! Response bodies are resolved into typed values here so the UI never
//! touches raw JSON.

use crate::model::response::{AgentResponse, TabularPayload};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Could not reach the server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication required. Please authenticate first.")]
    AuthRequired,

    #[error("{0}")]
    Backend(String),

    #[error("Unexpected response from server: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result of `GET /auth/status`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuthStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub auth_in_progress: bool,
}

/// Device code details returned when authentication starts
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeviceCode {
    pub device_code: Option<String>,
    pub verification_uri: Option<String>,
    pub expires_in: Option<u64>,
}

/// A predefined query offered by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct SavedQuery {
    pub alias: String,
    pub name: String,
    pub description: String,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("lwai-tui/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ask the data agent a question
    pub fn run_details(&self, question: &str) -> Result<AgentResponse, ApiError> {
        tracing::debug!(question, "POST /run-details");
        let resp = self
            .client
            .post(self.url("/run-details"))
            .json(&json!({ "question": question }))
            .send()?;
        let ok = resp.status().is_success();
        interpret_run_details(ok, read_json(resp)?)
    }

    pub fn auth_status(&self) -> Result<AuthStatus, ApiError> {
        let resp = self.client.get(self.url("/auth/status")).send()?;
        let body = checked_json(resp)?;
        Ok(serde_json::from_value(body)?)
    }

    /// Start the device code flow
    pub fn start_auth(&self) -> Result<DeviceCode, ApiError> {
        let resp = self.client.post(self.url("/auth/start")).send()?;
        let ok = resp.status().is_success();
        interpret_start_auth(ok, read_json(resp)?)
    }

    pub fn available_queries(&self) -> Result<Vec<SavedQuery>, ApiError> {
        let resp = self.client.get(self.url("/execute-query")).send()?;
        Ok(parse_available_queries(&checked_json(resp)?))
    }

    /// Run a predefined query by alias
    pub fn execute_query(&self, alias: &str) -> Result<AgentResponse, ApiError> {
        tracing::debug!(alias, "POST /execute-query");
        let resp = self
            .client
            .post(self.url("/execute-query"))
            .json(&json!({ "query_alias": alias }))
            .send()?;
        interpret_query_result(checked_json(resp)?)
    }
}

fn read_json(resp: Response) -> Result<Value, ApiError> {
    let text = resp.text()?;
    Ok(serde_json::from_str(&text)?)
}

/// Read a JSON body, failing on non-success status
fn checked_json(resp: Response) -> Result<Value, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Backend(format!("Error: {}", status)));
    }
    read_json(resp)
}

fn error_message(body: &Value, fallback: &str) -> String {
    body.get("error")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn interpret_run_details(ok: bool, body: Value) -> Result<AgentResponse, ApiError> {
    if !ok {
        if body.get("needs_auth").and_then(Value::as_bool) == Some(true) {
            return Err(ApiError::AuthRequired);
        }
        return Err(ApiError::Backend(error_message(
            &body,
            "Failed to get response from server",
        )));
    }

    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(ApiError::Backend(error_message(&body, "Request failed")));
    }

    let response = AgentResponse::from_json(&body);
    tracing::debug!(kind = response_kind(&response), "resolved agent response");
    Ok(response)
}

fn interpret_start_auth(ok: bool, body: Value) -> Result<DeviceCode, ApiError> {
    if !ok || body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(ApiError::Backend(error_message(
            &body,
            "Failed to start authentication",
        )));
    }
    Ok(serde_json::from_value(body)?)
}

fn parse_available_queries(body: &Value) -> Vec<SavedQuery> {
    let Some(queries) = body.get("available_queries").and_then(Value::as_object) else {
        return Vec::new();
    };

    queries
        .iter()
        .map(|(alias, info)| SavedQuery {
            alias: alias.clone(),
            name: info
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(alias)
                .to_string(),
            description: info
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

fn interpret_query_result(body: Value) -> Result<AgentResponse, ApiError> {
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(ApiError::Backend(error_message(&body, "Query failed")));
    }

    let table: TabularPayload = body
        .get("data_table")
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(|r| r.as_object().cloned()).collect())
        .unwrap_or_default();

    Ok(AgentResponse::StructuredMessage {
        text: String::new(),
        table: (!table.is_empty()).then_some(table),
    })
}

fn response_kind(response: &AgentResponse) -> &'static str {
    match response {
        AgentResponse::StructuredMessage { table: Some(_), .. } => "structured_with_table",
        AgentResponse::StructuredMessage { .. } => "structured",
        AgentResponse::RawMarkdown(_) => "raw_markdown",
        AgentResponse::Empty => "empty",
    }
}
