//! End-to-end tests of the dispatch loop through the shared agent.

mod common;

use std::sync::Arc;
use std::time::Duration;

use askdesk::agent::{Agent, DispatchSettings, DispatchStatus};
use askdesk::error::AgentError;
use askdesk::tools::{FnTool, ToolSchema, ValueType};
use askdesk::types::{Message, ToolOutcome, ToolRequest};
use askdesk::util::retry::RetryPolicy;
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn tool_results(messages: &[Message]) -> Vec<&ToolOutcome> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::ToolResult { outcome, .. } => Some(outcome),
            _ => None,
        })
        .collect()
}

fn result_ids(messages: &[Message]) -> Vec<&str> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::ToolResult { call_id, .. } => Some(call_id.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn multiplication_goes_through_the_tool() {
    let provider = Arc::new(ScriptedProvider::new());
    provider
        .queue_tool_call("call_1", "multiply", json!({"a": 7, "b": 8}))
        .queue_response("56");
    let agent = agent_with(provider.clone(), DispatchSettings::default());

    let interaction = agent.respond("s1", "what is 7 * 8?").await.unwrap();

    assert_eq!(interaction.status, DispatchStatus::Completed);
    assert!(interaction.answer.contains("56"));
    assert_eq!(tool_results(&interaction.messages), vec![&ToolOutcome::Success(json!(56))]);

    // The second model call sees the tool result.
    let second = &provider.requests()[1];
    assert_eq!(second.messages.len(), 3);
    assert_eq!(second.messages[2].text(), "56");
    assert_eq!(interaction.usage.total_tokens, 45);
}

#[tokio::test]
async fn division_by_zero_is_surfaced_and_the_loop_continues() {
    let provider = Arc::new(ScriptedProvider::new());
    provider
        .queue_tool_call("call_1", "divide", json!({"a": 5, "b": 0}))
        .queue_response("Sorry, dividing by zero is undefined.");
    let agent = agent_with(provider.clone(), DispatchSettings::default());

    let interaction = agent.respond("s1", "divide 5 by 0").await.unwrap();

    assert_eq!(interaction.status, DispatchStatus::Completed);
    assert_eq!(
        tool_results(&interaction.messages),
        vec![&ToolOutcome::Failure("cannot divide by zero".into())]
    );
    assert!(interaction.answer.starts_with("Sorry"));
    assert_eq!(provider.requests()[1].messages[2].text(), "Error: cannot divide by zero");
}

#[tokio::test]
async fn unknown_tools_and_bad_arguments_become_failures() {
    let provider = Arc::new(ScriptedProvider::new());
    provider
        .queue_tool_call("c1", "sqrt", json!({"x": 9}))
        .queue_tool_call("c2", "add", json!({"a": 1}))
        .queue_response("I could not compute that.");
    let agent = agent_with(provider, DispatchSettings::default());

    let interaction = agent.respond("s1", "sqrt 9 plus one").await.unwrap();

    let outcomes = tool_results(&interaction.messages);
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_failure()));
    assert!(outcomes[0].to_content().contains("unknown tool 'sqrt'"));
    assert!(outcomes[1].to_content().contains("missing required field 'b'"));
}

#[tokio::test]
async fn second_query_sees_the_first_turn() {
    let provider = Arc::new(ScriptedProvider::new());
    provider
        .queue_tool_call("call_1", "add", json!({"a": 2, "b": 3}))
        .queue_response("5")
        .queue_response("You asked me to add 2 and 3.");
    let agent = agent_with(provider.clone(), DispatchSettings::default());

    agent.respond("s1", "add 2 and 3").await.unwrap();
    let second = agent.respond("s1", "what did I just ask?").await.unwrap();

    let last_request = provider.requests().pop().unwrap();
    assert_eq!(last_request.messages[0].text(), "add 2 and 3");
    assert_eq!(last_request.messages.len(), 5);
    assert_eq!(second.messages.len(), 6);

    let session = agent.session("s1").unwrap();
    assert_eq!(session.user_turns(), 2);
    assert!(session.messages.last().unwrap().is_final_answer());
}

#[tokio::test]
async fn sessions_do_not_share_history() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.queue_response("hello a").queue_response("hello b");
    let agent = agent_with(provider.clone(), DispatchSettings::default());

    agent.respond("a", "hi").await.unwrap();
    agent.respond("b", "hi").await.unwrap();

    assert_eq!(provider.requests()[1].messages.len(), 1);
    assert_eq!(agent.sessions().session_ids(), vec!["a", "b"]);
}

#[tokio::test]
async fn user_turns_stay_in_chronological_order() {
    let provider = Arc::new(ScriptedProvider::repeating(text_response("ok")));
    let agent = agent_with(provider, DispatchSettings::default());

    let queries = ["first", "second", "third", "fourth"];
    for q in queries {
        agent.respond("s1", q).await.unwrap();
    }

    let session = agent.session("s1").unwrap();
    let users: Vec<String> = session
        .messages
        .iter()
        .filter(|m| m.is_user())
        .map(Message::text)
        .collect();
    assert_eq!(users, queries);
    assert!(session
        .messages
        .windows(2)
        .all(|w| w[0].timestamp() <= w[1].timestamp()));
}

#[tokio::test]
async fn always_requesting_model_stops_at_the_bound() {
    let provider = Arc::new(ScriptedProvider::repeating(tool_call_response(
        "call_x",
        "add",
        json!({"a": 1, "b": 1}),
    )));
    let settings = DispatchSettings::builder().max_iterations(3).build();
    let agent = agent_with(provider.clone(), settings);

    let interaction = agent.respond("s1", "keep adding").await.unwrap();

    assert_eq!(interaction.status, DispatchStatus::IterationLimit);
    assert_eq!(provider.call_count(), 4);
    let executed = tool_results(&interaction.messages)
        .into_iter()
        .filter(|o| !o.is_failure())
        .count();
    assert_eq!(executed, 3);
    assert!(interaction.answer.contains("unable to complete"));
    assert!(agent.session("s1").unwrap().messages.last().unwrap().is_final_answer());
}

#[tokio::test(start_paused = true)]
async fn transient_model_errors_are_retried() {
    let provider = Arc::new(ScriptedProvider::new());
    provider
        .queue_error(AgentError::api(503, "overloaded"))
        .queue_error(AgentError::RateLimited { retry_after_ms: Some(200) })
        .queue_response("recovered");
    let agent = agent_with(provider.clone(), DispatchSettings::default());

    let interaction = agent.respond("s1", "hello").await.unwrap();

    assert_eq!(interaction.status, DispatchStatus::Completed);
    assert_eq!(interaction.answer, "recovered");
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_end_with_an_apology() {
    let provider = Arc::new(ScriptedProvider::new());
    for _ in 0..2 {
        provider.queue_error(AgentError::api(500, "boom"));
    }
    let settings = DispatchSettings::builder()
        .retry(RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        })
        .build();
    let agent = agent_with(provider.clone(), settings);

    let interaction = agent.respond("s1", "hello").await.unwrap();

    assert_eq!(interaction.status, DispatchStatus::ModelFailure);
    assert!(interaction.answer.starts_with("Sorry"));
    assert_eq!(provider.call_count(), 2);
    // The failed interaction is still committed.
    assert_eq!(agent.session("s1").unwrap().messages.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn deadline_ends_the_interaction() {
    let provider = Arc::new(
        ScriptedProvider::repeating(text_response("too late")).with_delay(Duration::from_secs(5)),
    );
    let settings = DispatchSettings::builder()
        .run_deadline(Duration::from_secs(1))
        .build();
    let agent = agent_with(provider, settings);

    let interaction = agent.respond("s1", "slow question").await.unwrap();

    assert_eq!(interaction.status, DispatchStatus::DeadlineExceeded);
    assert!(interaction.answer.contains("deadline"));
    assert!(agent.session("s1").unwrap().messages.last().unwrap().is_final_answer());
}

#[tokio::test]
async fn system_prompt_is_sent_but_not_stored() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.queue_response("42");
    let settings = DispatchSettings::builder()
        .system_prompt("Always provide only the final answer.".to_string())
        .build();
    let agent = agent_with(provider.clone(), settings);

    agent.respond("s1", "meaning of life?").await.unwrap();

    assert_eq!(
        provider.requests()[0].system.as_deref(),
        Some("Always provide only the final answer.")
    );
    assert_eq!(agent.session("s1").unwrap().messages.len(), 2);
}

#[tokio::test]
async fn blank_query_is_rejected_before_the_model() {
    let provider = Arc::new(ScriptedProvider::new());
    let agent = agent_with(provider.clone(), DispatchSettings::default());

    let err = agent.respond("s1", "   ").await.unwrap_err();

    assert!(matches!(err, AgentError::InvalidArgument(_)));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn repeated_call_ids_in_one_turn_are_made_unique() {
    let provider = Arc::new(ScriptedProvider::new());
    provider
        .queue(tool_calls_response(vec![
            ToolRequest::new("call_0", "add", json!({"a": 1, "b": 2})),
            ToolRequest::new("call_0", "multiply", json!({"a": 3, "b": 4})),
        ]))
        .queue_response("3 and 12");
    let agent = agent_with(provider.clone(), DispatchSettings::default());

    let interaction = agent.respond("s1", "1+2 and 3*4?").await.unwrap();

    assert_eq!(interaction.status, DispatchStatus::Completed);
    assert_eq!(interaction.answer, "3 and 12");
    assert_eq!(result_ids(&interaction.messages), vec!["call_0", "call_0-2"]);
    assert_eq!(
        tool_results(&interaction.messages),
        vec![&ToolOutcome::Success(json!(3)), &ToolOutcome::Success(json!(12))]
    );
    let requested: Vec<&str> = interaction.messages[1]
        .tool_requests()
        .iter()
        .map(|r| r.call_id.as_str())
        .collect();
    assert_eq!(requested, vec!["call_0", "call_0-2"]);
    assert_eq!(agent.session("s1").unwrap().messages.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn deadline_during_a_tool_round_closes_every_request() {
    let slow = FnTool::new(
        "slow",
        "Never finishes in time",
        ToolSchema::builder().returns(ValueType::String).build(),
        |_args| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(json!("done"))
        },
    );
    let mut registry = arithmetic_registry();
    registry.register(Arc::new(slow)).unwrap();

    let provider = Arc::new(ScriptedProvider::new());
    provider.queue(tool_calls_response(vec![
        ToolRequest::new("fast", "add", json!({"a": 1, "b": 2})),
        ToolRequest::new("late", "slow", json!({})),
    ]));
    let settings = DispatchSettings::builder()
        .run_deadline(Duration::from_secs(1))
        .build();
    let agent = Agent::new(provider.clone(), Arc::new(registry), settings);

    let interaction = agent.respond("s1", "add then wait").await.unwrap();

    assert_eq!(interaction.status, DispatchStatus::DeadlineExceeded);
    assert_eq!(result_ids(&interaction.messages), vec!["fast", "late"]);
    assert_eq!(
        tool_results(&interaction.messages),
        vec![
            &ToolOutcome::Success(json!(3)),
            &ToolOutcome::Failure("not executed: run deadline exceeded".into()),
        ]
    );
    assert!(interaction.answer.contains("deadline"));
    assert_eq!(provider.call_count(), 1);
    assert!(agent.session("s1").unwrap().messages.last().unwrap().is_final_answer());
}
