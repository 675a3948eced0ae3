//! Shared test helpers and scripted provider.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use askdesk::agent::{Agent, DispatchSettings};
use askdesk::error::AgentError;
use askdesk::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use askdesk::tools::{arithmetic, ToolRegistry};
use askdesk::types::*;

/// A provider that replays queued responses and records every request.
///
/// Once the queue is empty it repeats `fallback`, or fails with a
/// non-retryable error when no fallback is set.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, AgentError>>>,
    fallback: Option<ProviderResponse>,
    delay: Option<Duration>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with `response`.
    pub fn repeating(response: ProviderResponse) -> Self {
        Self {
            fallback: Some(response),
            ..Self::new()
        }
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a text response.
    pub fn queue_response(&self, text: &str) -> &Self {
        self.script.lock().unwrap().push_back(Ok(text_response(text)));
        self
    }

    /// Queue a tool call response.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(tool_call_response(id, name, args)));
        self
    }

    /// Queue an arbitrary response.
    pub fn queue(&self, response: ProviderResponse) -> &Self {
        self.script.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Queue an error.
    pub fn queue_error(&self, error: AgentError) -> &Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, AgentError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| AgentError::InvalidState("script exhausted".into())),
        }
    }
}

pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        text: text.to_string(),
        usage: Usage {
            input_tokens: 10,
            output_tokens: 20,
            total_tokens: 30,
        },
        finish_reason: Some(FinishReason::Stop),
        ..Default::default()
    }
}

pub fn tool_call_response(id: &str, name: &str, args: serde_json::Value) -> ProviderResponse {
    ProviderResponse {
        tool_requests: vec![ToolRequest::new(id, name, args)],
        usage: Usage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        },
        finish_reason: Some(FinishReason::ToolCalls),
        ..Default::default()
    }
}

/// One assistant turn requesting several tools at once.
pub fn tool_calls_response(requests: Vec<ToolRequest>) -> ProviderResponse {
    ProviderResponse {
        tool_requests: requests,
        finish_reason: Some(FinishReason::ToolCalls),
        ..Default::default()
    }
}

/// Registry with the arithmetic tools only.
pub fn arithmetic_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register_all(arithmetic::all_tools())
        .expect("arithmetic tools have unique names");
    registry
}

/// Agent over a scripted provider and the arithmetic tools.
pub fn agent_with(provider: Arc<ScriptedProvider>, settings: DispatchSettings) -> Agent {
    Agent::new(provider, Arc::new(arithmetic_registry()), settings)
}
