//! Message and session identity domain types.
//!
//! Two message shapes flow through the system. `Message` is the durable
//! per-session record the client sees; `ChatMessage` is the ephemeral
//! role-tagged entry assembled fresh for each model invocation and thrown
//! away when the turn ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provider::ToolCallRequest;
use crate::tool::ResolvedToolCall;

/// Unique identifier for a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a conversation entry speaks as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting
    User,
    /// The assistant's replies
    Assistant,
    /// Persona and grounding instructions
    System,
    /// A tool's result fed back to the model
    Tool,
}

/// A single message in a session's durable history.
///
/// Immutable once appended; history is only ever reset wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Speaker of this entry
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls that were resolved while producing this message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ResolvedToolCall>,

    /// Set when this message is the fixed failure notice for an aborted turn
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// A user-authored message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// An assistant reply.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create the assistant-role failure notice for a turn that aborted.
    pub fn error(content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Assistant, content);
        msg.is_error = true;
        msg
    }

    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    /// Attach resolved tool calls to this message.
    pub fn with_tool_calls(mut self, calls: Vec<ResolvedToolCall>) -> Self {
        self.tool_calls = calls;
        self
    }
}

/// A role-tagged message in the model-facing conversation context.
///
/// Built fresh per turn by the prompt assembler and extended by the turn
/// orchestrator when folding tool results in. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who "says" this entry to the model
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool invocations declared by the assistant (follow-up pass only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,

    /// If this is a tool result, which call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// A system-role entry.
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    /// A user-role entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    /// An assistant-role entry.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// An assistant-role entry declaring tool invocations.
    pub fn assistant_tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// A tool-role entry carrying one call's result, correlated by call id.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_starts_clean() {
        let msg = Message::user("Can you help me apply?");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Can you help me apply?");
        assert!(msg.tool_calls.is_empty());
        assert!(!msg.is_error);
    }

    #[test]
    fn error_message_is_flagged() {
        let msg = Message::error("Sorry, something went wrong.");
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.is_error);
    }

    #[test]
    fn message_survives_serde() {
        let msg = Message::assistant("Start with the job search page.");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, msg.content);
        assert_eq!(back.role, Role::Assistant);
    }

    #[test]
    fn error_flag_omitted_when_clear() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert!(!json.contains("is_error"));
        let json = serde_json::to_string(&Message::error("oops")).unwrap();
        assert!(json.contains(r#""is_error":true"#));
    }

    #[test]
    fn tool_result_carries_call_id() {
        let msg = ChatMessage::tool_result("call_1", r#"{"ok":true}"#);
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), r#""assistant""#);
        assert_eq!(serde_json::to_string(&Role::Tool).unwrap(), r#""tool""#);
    }
}
