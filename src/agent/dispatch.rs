//! The bounded tool-calling loop.
//!
//! One interaction moves through three states:
//!
//! ```text
//! AwaitingModel --(tool requests)--> ExecutingTools --> AwaitingModel
//!       |
//!       +--(plain answer | failure | limit)--> Done
//! ```
//!
//! Every exit, normal or not, leaves the new messages ending with an
//! assistant message that has no outstanding tool request.

use std::collections::HashSet;
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::provider::{ModelProvider, ProviderRequest};
use crate::tools::ToolRegistry;
use crate::types::{GenerationSettings, Message, ToolOutcome, ToolRequest, Usage};
use crate::util::retry::RetryPolicy;

pub const DEFAULT_MAX_ITERATIONS: usize = 10;
pub const DEFAULT_RUN_DEADLINE: Duration = Duration::from_secs(120);

/// Knobs for one dispatch loop.
#[derive(Debug, Clone, Builder)]
pub struct DispatchSettings {
    /// Sent ahead of the history on every model call; never stored.
    pub system_prompt: Option<String>,
    #[builder(default)]
    pub generation: GenerationSettings,
    /// Maximum number of tool rounds per interaction.
    #[builder(default = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,
    #[builder(default = DEFAULT_RUN_DEADLINE)]
    pub run_deadline: Duration,
    #[builder(default)]
    pub retry: RetryPolicy,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// How an interaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DispatchStatus {
    /// The model answered without requesting tools.
    Completed,
    /// The model kept requesting tools past `max_iterations`.
    IterationLimit,
    /// The model could not be reached, even after retries.
    ModelFailure,
    /// The run deadline elapsed.
    DeadlineExceeded,
}

/// Result of one interaction.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Text of the final assistant message.
    pub answer: String,
    /// Messages produced by this interaction, starting with the user query.
    pub messages: Vec<Message>,
    pub status: DispatchStatus,
    pub usage: Usage,
    /// Tool rounds actually executed.
    pub tool_rounds: usize,
}

enum LoopState {
    AwaitingModel,
    ExecutingTools(Vec<ToolRequest>),
    Done(DispatchStatus),
}

/// Drives one interaction against a provider and a tool registry.
pub struct DispatchLoop<'a> {
    provider: &'a dyn ModelProvider,
    registry: &'a ToolRegistry,
    settings: &'a DispatchSettings,
}

impl<'a> DispatchLoop<'a> {
    pub fn new(
        provider: &'a dyn ModelProvider,
        registry: &'a ToolRegistry,
        settings: &'a DispatchSettings,
    ) -> Self {
        Self {
            provider,
            registry,
            settings,
        }
    }

    /// Answer `query` given the prior `history` of the session.
    ///
    /// Never fails: model and tool errors become messages.
    pub async fn run(&self, history: &[Message], query: &str) -> DispatchOutcome {
        let deadline = Instant::now() + self.settings.run_deadline;
        let mut run = Run {
            history,
            new: vec![Message::user(query)],
            usage: Usage::default(),
            tool_rounds: 0,
        };

        let mut state = LoopState::AwaitingModel;
        let status = loop {
            state = match state {
                LoopState::AwaitingModel => self.await_model(&mut run, deadline).await,
                LoopState::ExecutingTools(requests) => {
                    self.execute_tools(&mut run, requests, deadline).await
                }
                LoopState::Done(status) => break status,
            };
        };

        let answer = run
            .new
            .last()
            .filter(|m| m.is_final_answer())
            .map(Message::text)
            .unwrap_or_default();
        debug!(
            provider = self.provider.provider_name(),
            %status,
            tool_rounds = run.tool_rounds,
            messages = run.new.len(),
            "dispatch finished"
        );

        DispatchOutcome {
            answer,
            messages: run.new,
            status,
            usage: run.usage,
            tool_rounds: run.tool_rounds,
        }
    }

    async fn await_model(&self, run: &mut Run<'_>, deadline: Instant) -> LoopState {
        let request = ProviderRequest {
            system: self.settings.system_prompt.clone(),
            messages: run.transcript(),
            settings: self.settings.generation.clone(),
            tools: self.registry.definitions(),
        };
        debug!(
            model = self.provider.model_id(),
            messages = request.messages.len(),
            round = run.tool_rounds,
            "calling model"
        );

        let call = self.settings.retry.execute(|| self.provider.complete(&request));
        let mut response = match timeout_at(deadline, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                warn!(error = %err, "model call failed");
                run.new.push(Message::assistant(model_failure_message(&err)));
                return LoopState::Done(DispatchStatus::ModelFailure);
            }
            Err(_) => return self.deadline_exceeded(run),
        };

        run.usage.merge(&response.usage);
        unique_call_ids(&mut response.tool_requests);
        let requests = response.tool_requests.clone();
        run.new.push(response.into_message());

        if requests.is_empty() {
            return LoopState::Done(DispatchStatus::Completed);
        }
        if run.tool_rounds >= self.settings.max_iterations {
            warn!(
                max_iterations = self.settings.max_iterations,
                "tool round limit reached"
            );
            run.skip_outstanding("tool round limit reached");
            run.new.push(Message::assistant(format!(
                "I was unable to complete this request within {} tool rounds.",
                self.settings.max_iterations
            )));
            return LoopState::Done(DispatchStatus::IterationLimit);
        }
        LoopState::ExecutingTools(requests)
    }

    async fn execute_tools(
        &self,
        run: &mut Run<'_>,
        requests: Vec<ToolRequest>,
        deadline: Instant,
    ) -> LoopState {
        for request in requests {
            let invoke = self.registry.invoke(&request.tool_name, &request.arguments);
            let outcome = match timeout_at(deadline, invoke).await {
                Ok(Ok(value)) => ToolOutcome::Success(value),
                Ok(Err(err)) => {
                    warn!(tool = %request.tool_name, call_id = %request.call_id, error = %err, "tool failed");
                    ToolOutcome::Failure(err.to_string())
                }
                Err(_) => return self.deadline_exceeded(run),
            };
            run.new.push(Message::tool_result(
                request.tool_name,
                request.call_id,
                outcome,
            ));
        }
        run.tool_rounds += 1;
        LoopState::AwaitingModel
    }

    fn deadline_exceeded(&self, run: &mut Run<'_>) -> LoopState {
        warn!(
            deadline_secs = self.settings.run_deadline.as_secs(),
            "run deadline exceeded"
        );
        run.skip_outstanding("run deadline exceeded");
        run.new.push(Message::assistant(format!(
            "I was unable to complete this request before the {}s deadline.",
            self.settings.run_deadline.as_secs()
        )));
        LoopState::Done(DispatchStatus::DeadlineExceeded)
    }
}

/// Mutable state of one interaction.
struct Run<'h> {
    history: &'h [Message],
    new: Vec<Message>,
    usage: Usage,
    tool_rounds: usize,
}

impl Run<'_> {
    fn transcript(&self) -> Vec<Message> {
        self.history.iter().chain(&self.new).cloned().collect()
    }

    /// Close every request of the latest assistant turn that has no result yet,
    /// so the provider never sees an unanswered tool call.
    fn skip_outstanding(&mut self, reason: &str) {
        let Some(turn) = self.new.iter().rposition(|m| !m.tool_requests().is_empty()) else {
            return;
        };
        let answered: Vec<String> = self.new[turn + 1..]
            .iter()
            .filter_map(|m| match m {
                Message::ToolResult { call_id, .. } => Some(call_id.clone()),
                _ => None,
            })
            .collect();
        let missing: Vec<ToolRequest> = self.new[turn]
            .tool_requests()
            .iter()
            .filter(|r| !answered.contains(&r.call_id))
            .cloned()
            .collect();
        for request in missing {
            self.new.push(Message::tool_result(
                request.tool_name,
                request.call_id,
                ToolOutcome::Failure(format!("not executed: {reason}")),
            ));
        }
    }
}

/// Rename repeated call ids within one turn (`call_0`, `call_0-2`, ...) so
/// each request gets exactly one result and the turn can be stored.
fn unique_call_ids(requests: &mut [ToolRequest]) {
    let mut seen = HashSet::new();
    for request in requests.iter_mut() {
        if seen.insert(request.call_id.clone()) {
            continue;
        }
        let mut n = 2;
        let renamed = loop {
            let candidate = format!("{}-{n}", request.call_id);
            if seen.insert(candidate.clone()) {
                break candidate;
            }
            n += 1;
        };
        warn!(call_id = %request.call_id, renamed = %renamed, "duplicate tool call id");
        request.call_id = renamed;
    }
}

fn model_failure_message(err: &AgentError) -> String {
    format!("Sorry, I could not get an answer from the language model ({err}). Please try again.")
}
