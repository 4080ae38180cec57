//! Provider trait — the abstraction over the chat-completion backend.
//!
//! A Provider knows how to send an assembled conversation to the model and
//! get a response back, either as a complete message or as a stream of
//! chunks. Tool invocations the model declares mid-stream arrive fully
//! reassembled on the terminal chunk.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::ChatMessage;

/// Configuration for one model invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to use (e.g., "google-ai-studio/gemini-2.5-flash")
    pub model: String,

    /// The assembled conversation context
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature, 0.0 pins the output down
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion length cap, forwarded when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tools the model may call; empty disables tool use
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.7
}

impl ChatRequest {
    /// A request with library defaults for everything but model and messages.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: default_temperature(),
            max_tokens: None,
            tools: Vec::new(),
        }
    }
}

/// A tool definition announced to the model so it knows what it may call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// What the tool does, in model-facing words
    pub description: String,

    /// JSON Schema for the tool's arguments
    pub parameters: serde_json::Value,
}

/// A model-declared tool invocation, as it comes off the wire.
///
/// `arguments` is the raw JSON text; for streamed responses it is the
/// byte-exact concatenation of every fragment the model emitted, parsed
/// only once the call is handed to the execution bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Unique call ID assigned by the model
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a raw JSON object string
    pub arguments: String,
}

impl ToolCallRequest {
    /// A call is executable once it has a name; argument validity is the
    /// bridge's problem.
    pub fn is_executable(&self) -> bool {
        !self.name.is_empty()
    }
}

/// A complete (non-streaming) model response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text (may be empty when tool calls were declared)
    pub text: String,

    /// Tool invocations the model wants executed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

/// One element of a streaming response.
///
/// Text deltas arrive with `done == false`. The terminal chunk has
/// `done == true` and carries the fully reassembled tool calls, if any —
/// a non-empty `tool_calls` on the terminal chunk is the tool-call
/// termination signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Incremental text, forwarded in arrival order
    #[serde(default)]
    pub content: Option<String>,

    /// Reassembled tool calls (terminal chunk only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,

    /// Marks the terminal chunk
    #[serde(default)]
    pub done: bool,
}

/// The chat-completion backend.
///
/// The turn orchestrator calls `complete()` or `stream()` without knowing
/// which backend is in play — pure polymorphism.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai-compat").
    fn name(&self) -> &str;

    /// One request, one whole response.
    async fn complete(
        &self,
        request: ChatRequest,
    ) -> std::result::Result<Completion, ProviderError>;

    /// One request, chunks as the model produces them.
    ///
    /// The default wraps `complete()` into a text chunk followed by the
    /// terminal chunk, for backends with no native streaming.
    async fn stream(
        &self,
        request: ChatRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>,
        ProviderError,
    > {
        let response = self.complete(request).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(2);
        if !response.text.is_empty() {
            let _ = tx
                .send(Ok(StreamChunk {
                    content: Some(response.text),
                    tool_calls: Vec::new(),
                    done: false,
                }))
                .await;
        }
        let _ = tx
            .send(Ok(StreamChunk {
                content: None,
                tool_calls: response.tool_calls,
                done: true,
            }))
            .await;
        Ok(rx)
    }
}

impl std::fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider").field("name", &self.name()).finish()
    }
}
