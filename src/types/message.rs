//! Conversation messages exchanged between the user, the model, and tools.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    User {
        text: String,
        timestamp: DateTime<Utc>,
    },
    Assistant {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_requests: Vec<ToolRequest>,
        timestamp: DateTime<Utc>,
    },
    ToolResult {
        tool_name: String,
        call_id: String,
        outcome: ToolOutcome,
        timestamp: DateTime<Utc>,
    },
}

impl Message {
    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant message without tool requests.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::assistant_with_requests(text, Vec::new())
    }

    /// Create an assistant message that asks for tool invocations.
    pub fn assistant_with_requests(text: impl Into<String>, tool_requests: Vec<ToolRequest>) -> Self {
        Self::Assistant {
            text: text.into(),
            tool_requests,
            timestamp: Utc::now(),
        }
    }

    /// Create a tool result message.
    pub fn tool_result(
        tool_name: impl Into<String>,
        call_id: impl Into<String>,
        outcome: ToolOutcome,
    ) -> Self {
        Self::ToolResult {
            tool_name: tool_name.into(),
            call_id: call_id.into(),
            outcome,
            timestamp: Utc::now(),
        }
    }

    /// Text content of user and assistant messages; rendered outcome for tool results.
    pub fn text(&self) -> String {
        match self {
            Self::User { text, .. } | Self::Assistant { text, .. } => text.clone(),
            Self::ToolResult { outcome, .. } => outcome.to_content(),
        }
    }

    /// Tool requests carried by an assistant message.
    pub fn tool_requests(&self) -> &[ToolRequest] {
        match self {
            Self::Assistant { tool_requests, .. } => tool_requests,
            _ => &[],
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::User { timestamp, .. }
            | Self::Assistant { timestamp, .. }
            | Self::ToolResult { timestamp, .. } => *timestamp,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    /// An assistant message with no outstanding tool request.
    pub fn is_final_answer(&self) -> bool {
        matches!(self, Self::Assistant { tool_requests, .. } if tool_requests.is_empty())
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolRequest {
    pub call_id: String,
    pub tool_name: String,
    /// JSON object mapping parameter name to value.
    pub arguments: serde_json::Value,
}

impl ToolRequest {
    pub fn new(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Result of executing one tool request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success(serde_json::Value),
    Failure(String),
}

impl ToolOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Render the outcome as the content string sent back to the model.
    pub fn to_content(&self) -> String {
        match self {
            Self::Success(serde_json::Value::String(s)) => s.clone(),
            Self::Success(value) => value.to_string(),
            Self::Failure(message) => format!("Error: {message}"),
        }
    }
}
