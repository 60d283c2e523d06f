//! Assistant response model
//!
//! The backend answers in several shapes (a run-details object with assistant
//! messages and an optional `data_table`, a legacy plain string, or a bare
//! `{ "response": ... }` object). Everything is resolved into `AgentResponse`
//! once, at the network boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flat key/value records, key order preserved
pub type TabularPayload = Vec<Map<String, Value>>;

/// Text shown when the backend returned nothing usable
pub const NO_RESPONSE_TEXT: &str = "No response received from the data agent.";

/// A resolved assistant answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AgentResponse {
    /// Structured answer: assistant text plus an optional tabular payload
    StructuredMessage {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table: Option<TabularPayload>,
    },
    /// Plain markdown (may contain a pipe table)
    RawMarkdown(String),
    /// Nothing usable was returned
    Empty,
}

impl AgentResponse {
    /// The prose of the answer
    pub fn text(&self) -> &str {
        match self {
            AgentResponse::StructuredMessage { text, .. } => text,
            AgentResponse::RawMarkdown(text) => text,
            AgentResponse::Empty => NO_RESPONSE_TEXT,
        }
    }

    /// Response text with table markup removed, for display above the grid
    pub fn prose(&self) -> String {
        self.text()
            .split('\n')
            .filter(|line| !line.contains('|'))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    /// Resolve an arbitrary backend JSON body
    pub fn from_json(body: &Value) -> AgentResponse {
        match body {
            Value::String(s) if s.trim().is_empty() => AgentResponse::Empty,
            Value::String(s) => AgentResponse::RawMarkdown(s.clone()),
            Value::Object(obj) => Self::from_object(obj),
            _ => AgentResponse::Empty,
        }
    }

    fn from_object(obj: &Map<String, Value>) -> AgentResponse {
        let table = obj
            .get("data_table")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(|r| r.as_object().cloned())
                    .collect::<TabularPayload>()
            })
            .filter(|rows| !rows.is_empty());

        if let Some(text) = latest_assistant_text(obj) {
            return AgentResponse::StructuredMessage { text, table };
        }

        if let Some(table) = table {
            return AgentResponse::StructuredMessage {
                text: String::new(),
                table: Some(table),
            };
        }

        // Fallbacks used while the agent is still producing data
        if let Some(preview) = obj
            .get("sql_data_previews")
            .and_then(Value::as_array)
            .and_then(|p| p.first())
        {
            let text = match preview {
                Value::Array(lines) => lines
                    .iter()
                    .map(value_to_plain_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
                other => value_to_plain_string(other),
            };
            return AgentResponse::RawMarkdown(text);
        }

        if let Some(query) = obj
            .get("sql_queries")
            .and_then(Value::as_array)
            .and_then(|q| q.first())
            .and_then(Value::as_str)
        {
            return AgentResponse::RawMarkdown(format!(
                "**Query Executed:**\n```sql\n{}\n```\n\n*Waiting for data...*",
                query
            ));
        }

        match obj.get("response").and_then(Value::as_str) {
            Some(text) if !text.trim().is_empty() => AgentResponse::RawMarkdown(text.to_string()),
            _ => AgentResponse::Empty,
        }
    }
}

/// Text of the last assistant message's first text content
fn latest_assistant_text(obj: &Map<String, Value>) -> Option<String> {
    let messages = obj.get("messages")?.get("data")?.as_array()?;
    let latest = messages
        .iter()
        .filter(|m| m.get("role").and_then(Value::as_str) == Some("assistant"))
        .last()?;
    latest
        .get("content")?
        .as_array()?
        .first()?
        .get("text")?
        .get("value")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn value_to_plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_message_uses_last_assistant() {
        let body = json!({
            "success": true,
            "messages": { "data": [
                { "role": "user", "content": [{ "text": { "value": "question" } }] },
                { "role": "assistant", "content": [{ "text": { "value": "first" } }] },
                { "role": "assistant", "content": [{ "text": { "value": "latest" } }] }
            ]}
        });
        assert_eq!(
            AgentResponse::from_json(&body),
            AgentResponse::StructuredMessage {
                text: "latest".into(),
                table: None
            }
        );
    }

    #[test]
    fn test_structured_message_with_data_table() {
        let body = json!({
            "messages": { "data": [
                { "role": "assistant", "content": [{ "text": { "value": "Here you go" } }] }
            ]},
            "data_table": [{ "client_name": "Alice", "total": 3 }]
        });
        match AgentResponse::from_json(&body) {
            AgentResponse::StructuredMessage { text, table } => {
                assert_eq!(text, "Here you go");
                let table = table.unwrap();
                assert_eq!(table.len(), 1);
                assert_eq!(table[0]["client_name"], json!("Alice"));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_empty_data_table_is_dropped() {
        let body = json!({
            "messages": { "data": [
                { "role": "assistant", "content": [{ "text": { "value": "none" } }] }
            ]},
            "data_table": []
        });
        assert_eq!(
            AgentResponse::from_json(&body),
            AgentResponse::StructuredMessage {
                text: "none".into(),
                table: None
            }
        );
    }

    #[test]
    fn test_legacy_string_body() {
        let body = json!("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(matches!(
            AgentResponse::from_json(&body),
            AgentResponse::RawMarkdown(_)
        ));
    }

    #[test]
    fn test_ask_endpoint_shape() {
        let body = json!({ "success": true, "question": "q", "response": "hello" });
        assert_eq!(
            AgentResponse::from_json(&body),
            AgentResponse::RawMarkdown("hello".into())
        );
    }

    #[test]
    fn test_sql_fallbacks() {
        let body = json!({ "sql_data_previews": [["a | b", "1 | 2"]] });
        assert_eq!(
            AgentResponse::from_json(&body),
            AgentResponse::RawMarkdown("a | b\n1 | 2".into())
        );

        let body = json!({ "sql_queries": ["SELECT 1"] });
        let resolved = AgentResponse::from_json(&body);
        assert!(resolved.text().contains("SELECT 1"));
        assert!(resolved.text().contains("Waiting for data"));
    }

    #[test]
    fn test_unknown_shapes_are_empty() {
        assert_eq!(AgentResponse::from_json(&json!(42)), AgentResponse::Empty);
        assert_eq!(AgentResponse::from_json(&json!({})), AgentResponse::Empty);
        assert_eq!(AgentResponse::from_json(&json!("  ")), AgentResponse::Empty);
        assert_eq!(AgentResponse::Empty.text(), NO_RESPONSE_TEXT);
    }

    #[test]
    fn test_prose_strips_table_lines() {
        let response = AgentResponse::RawMarkdown(
            "Top agents:\n\n| Name | Count |\n|---|---|\n| Alice | 3 |\n\n*Data sorted by count*".into(),
        );
        assert_eq!(response.prose(), "Top agents:\n\n\n*Data sorted by count*");
    }

    #[test]
    fn test_serde_round_trip_keeps_variant() {
        let response = AgentResponse::StructuredMessage {
            text: "t".into(),
            table: Some(vec![json!({"b": 1, "a": 2}).as_object().unwrap().clone()]),
        };
        let json = serde_json::to_string(&response).unwrap();
        let back: AgentResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }
}
