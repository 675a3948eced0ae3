//! Per-session conversation memory.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::types::Message;

/// One conversation, identified by an opaque session id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of user turns recorded so far.
    pub fn user_turns(&self) -> usize {
        self.messages.iter().filter(|m| m.is_user()).count()
    }

    /// Append after checking that every tool result answers a request made
    /// earlier in the conversation and that call ids are unique per turn.
    fn extend(&mut self, messages: Vec<Message>) -> Result<()> {
        let mut requested: HashSet<&str> = self
            .messages
            .iter()
            .flat_map(|m| m.tool_requests())
            .map(|r| r.call_id.as_str())
            .collect();

        for message in &messages {
            match message {
                Message::Assistant { tool_requests, .. } => {
                    let mut turn = HashSet::new();
                    for request in tool_requests {
                        if !turn.insert(request.call_id.as_str()) {
                            return Err(AgentError::InvalidState(format!(
                                "duplicate call_id '{}' in one assistant turn",
                                request.call_id
                            )));
                        }
                    }
                    requested.extend(turn);
                }
                Message::ToolResult { call_id, .. } if !requested.contains(call_id.as_str()) => {
                    return Err(AgentError::InvalidState(format!(
                        "tool result references unknown call_id '{call_id}'"
                    )));
                }
                _ => {}
            }
        }

        self.messages.extend(messages);
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory session table, kept for the lifetime of the process.
///
/// Callers serialize interactions on the same session; distinct sessions
/// may be read and appended concurrently.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a session, creating an empty one on first use.
    pub fn get_or_create(&self, session_id: &str) -> Session {
        if let Some(session) = self.get(session_id) {
            return session;
        }
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id))
            .clone()
    }

    /// Append messages to a session, creating it if needed.
    ///
    /// Nothing is appended when any message breaks the call id rules.
    pub fn append(&self, session_id: &str, messages: Vec<Message>) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id))
            .extend(messages)
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    /// Session ids in sorted order.
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
