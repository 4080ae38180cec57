//! The turn orchestrator.
//!
//! Drives one conversational turn end-to-end: rank the knowledge base
//! against the user's message, assemble the prompt, invoke the provider,
//! run the tool round-trip when the model asks for one, and fold the final
//! reply back into session state.
//!
//! Streaming turns forward text chunks in arrival order, write one
//! `<CONTEXT>…</CONTEXT>` payload as the final stream element, and
//! reconcile the reconstructed reply into history when the stream ends.
//! The session's `is_processing` flag is cleared before the terminal write
//! and on every failure path; a failed turn never leaves it set.

use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use chatarbor_core::document::DocumentStore;
use chatarbor_core::error::{Result, SessionError};
use chatarbor_core::message::{ChatMessage, Message, SessionId};
use chatarbor_core::provider::{ChatRequest, Provider, ToolCallRequest};
use chatarbor_core::tool::{ResolvedToolCall, ToolRegistry};
use chatarbor_retrieval::scorer::rank;
use chatarbor_tools::execute_all;

use crate::prompt::PromptAssembler;
use crate::session::{SessionState, SessionStore};

/// Opening sentinel separating visible answer text from context metadata.
pub const CONTEXT_OPEN: &str = "<CONTEXT>";
/// Closing sentinel; always the last bytes of a streamed turn.
pub const CONTEXT_CLOSE: &str = "</CONTEXT>";

/// Fixed user-visible text for a turn that failed after it started.
const PROCESSING_ERROR_TEXT: &str = "Sorry, I encountered an error. Please try again.";

/// Fallback reply when the follow-up pass produced no text.
const TOOL_FALLBACK_TEXT: &str = "Tool results processed successfully.";

/// The result of a completed (non-streaming) turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant message appended to history.
    pub message: Message,
    /// The rendered retrieved-context block ("" when nothing matched).
    pub context: String,
}

/// Orchestrates turns against one provider / document store / tool set.
pub struct TurnOrchestrator {
    provider: Arc<dyn Provider>,
    documents: Arc<dyn DocumentStore>,
    tools: Arc<ToolRegistry>,
    sessions: Arc<SessionStore>,
    system_instruction: String,
    history_window: usize,
    top_k: usize,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl TurnOrchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        documents: Arc<dyn DocumentStore>,
        tools: Arc<ToolRegistry>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            provider,
            documents,
            tools,
            sessions,
            system_instruction: String::new(),
            history_window: 5,
            top_k: 2,
            temperature: 0.7,
            max_tokens: None,
        }
    }

    /// Set the system instruction (blank falls back to the built-in default).
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Set how many recent history messages each prompt carries.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Set how many retrieved documents are injected as context.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the per-completion token cap.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// The session store this orchestrator mutates.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    fn assembler(&self) -> PromptAssembler {
        PromptAssembler::new(self.system_instruction.clone(), self.history_window)
    }

    /// Run one non-streaming turn.
    ///
    /// Empty input and a busy session are rejected before any state is
    /// touched. Failures after the turn started come back as the fixed
    /// error-marked assistant message, not as `Err`.
    pub async fn run_turn(
        &self,
        session_id: &SessionId,
        user_message: &str,
        requested_model: Option<String>,
    ) -> Result<TurnOutcome> {
        let trimmed = user_message.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyMessage.into());
        }

        let start = self.begin_turn(session_id, trimmed, requested_model).await?;
        info!(session = %session_id, model = %start.model, "Processing turn");

        match self.drive(trimmed, &start.history, &start.model).await {
            Ok(driven) => {
                let message = Message::assistant(driven.text).with_tool_calls(driven.tool_calls);
                finish_turn(&start.session, message.clone()).await;
                Ok(TurnOutcome {
                    message,
                    context: driven.context,
                })
            }
            Err(e) => {
                error!(session = %session_id, error = %e, "Turn failed");
                let message = Message::error(PROCESSING_ERROR_TEXT);
                finish_turn(&start.session, message.clone()).await;
                Ok(TurnOutcome {
                    message,
                    context: String::new(),
                })
            }
        }
    }

    /// Run one streaming turn.
    ///
    /// Returns the receiver for the turn's UTF-8 text chunks; the context
    /// payload is always the final element. The reply is reconciled into
    /// session history when the stream completes, and a dropped receiver
    /// abandons the upstream fetch without corrupting session state.
    pub async fn run_turn_streaming(
        &self,
        session_id: &SessionId,
        user_message: &str,
        requested_model: Option<String>,
    ) -> Result<mpsc::Receiver<String>> {
        let trimmed = user_message.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyMessage.into());
        }

        let start = self.begin_turn(session_id, trimmed, requested_model).await?;
        info!(session = %session_id, model = %start.model, "Processing streaming turn");

        let (tx, rx) = mpsc::channel::<String>(64);
        let stream_turn = StreamTurn {
            provider: self.provider.clone(),
            documents: self.documents.clone(),
            tools: self.tools.clone(),
            assembler: self.assembler(),
            top_k: self.top_k,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            user_message: trimmed.to_string(),
            history: start.history,
            model: start.model,
            session: start.session,
        };
        tokio::spawn(stream_turn.run(tx));

        Ok(rx)
    }

    /// Validate the session is free, apply a model swap, append the user
    /// message, and raise the processing flag — all under one lock.
    async fn begin_turn(
        &self,
        session_id: &SessionId,
        trimmed: &str,
        requested_model: Option<String>,
    ) -> Result<TurnStart> {
        let session = self.sessions.get_or_create(session_id).await;
        let (history, model) = {
            let mut state = session.lock().await;
            if state.is_processing {
                return Err(SessionError::Busy(session_id.to_string()).into());
            }
            if let Some(model) = requested_model {
                if model != state.model {
                    info!(session = %session_id, %model, "Switching session model");
                    state.model = model;
                }
            }
            let history = state.messages.clone();
            state.push(Message::user(trimmed));
            state.is_processing = true;
            (history, state.model.clone())
        };
        Ok(TurnStart {
            session,
            history,
            model,
        })
    }

    /// Retrieval → assembly → completion, with at most one tool round.
    async fn drive(&self, user_message: &str, history: &[Message], model: &str) -> Result<Driven> {
        let documents = self.documents.list().await?;
        let retrieved = rank(user_message, &documents, self.top_k);
        debug!(retrieved = retrieved.len(), "Knowledge documents selected");

        let assembler = self.assembler();
        let context = assembler.render_context(&retrieved);
        let messages = assembler.assemble(&retrieved, history, user_message);

        let request = ChatRequest {
            model: model.to_string(),
            messages: messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.definitions(),
        };
        let completion = self.provider.complete(request).await?;

        if completion.tool_calls.is_empty() {
            return Ok(Driven {
                text: completion.text,
                tool_calls: Vec::new(),
                context,
            });
        }

        debug!(count = completion.tool_calls.len(), "Executing tool calls");
        let resolved = execute_all(&self.tools, &completion.tool_calls).await;
        let followup = fold_tool_results(messages, completion.tool_calls, &resolved);

        let request = ChatRequest {
            model: model.to_string(),
            messages: followup,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: Vec::new(),
        };
        let completion = self.provider.complete(request).await?;
        let text = if completion.text.is_empty() {
            TOOL_FALLBACK_TEXT.to_string()
        } else {
            completion.text
        };

        Ok(Driven {
            text,
            tool_calls: resolved,
            context,
        })
    }
}

struct TurnStart {
    session: Arc<Mutex<SessionState>>,
    history: Vec<Message>,
    model: String,
}

struct Driven {
    text: String,
    tool_calls: Vec<ResolvedToolCall>,
    context: String,
}

/// Append the assistant reply and release the session.
async fn finish_turn(session: &Arc<Mutex<SessionState>>, message: Message) {
    let mut state = session.lock().await;
    state.push(message);
    state.is_processing = false;
}

/// Extend the assembled context with the assistant's tool-call declaration
/// and one tool-role result message per executed call, correlated by id.
fn fold_tool_results(
    mut messages: Vec<ChatMessage>,
    declarations: Vec<ToolCallRequest>,
    resolved: &[ResolvedToolCall],
) -> Vec<ChatMessage> {
    messages.push(ChatMessage::assistant_tool_calls(declarations));
    for call in resolved {
        let payload = serde_json::to_string(&call.result).unwrap_or_else(|_| "null".into());
        messages.push(ChatMessage::tool_result(&call.id, payload));
    }
    messages
}

/// Everything a spawned streaming turn needs, detached from the orchestrator.
struct StreamTurn {
    provider: Arc<dyn Provider>,
    documents: Arc<dyn DocumentStore>,
    tools: Arc<ToolRegistry>,
    assembler: PromptAssembler,
    top_k: usize,
    temperature: f32,
    max_tokens: Option<u32>,
    user_message: String,
    history: Vec<Message>,
    model: String,
    session: Arc<Mutex<SessionState>>,
}

impl StreamTurn {
    async fn run(self, tx: mpsc::Sender<String>) {
        let mut full_text = String::new();
        let mut resolved: Vec<ResolvedToolCall> = Vec::new();
        let mut context = String::new();

        let outcome = self
            .forward(&tx, &mut full_text, &mut resolved, &mut context)
            .await;

        let message = match outcome {
            Ok(()) => Message::assistant(full_text).with_tool_calls(resolved),
            Err(e) => {
                error!(error = %e, "Streaming turn failed");
                let _ = tx.send(PROCESSING_ERROR_TEXT.to_string()).await;
                Message::error(PROCESSING_ERROR_TEXT)
            }
        };

        // Reconcile before the terminal write so the flag is already clear
        // when the consumer sees the stream close.
        {
            let mut state = self.session.lock().await;
            state.push(message);
            state.is_processing = false;
        }

        // The context payload is always the last element on the stream.
        let _ = tx
            .send(format!("\n{CONTEXT_OPEN}{context}{CONTEXT_CLOSE}"))
            .await;
    }

    async fn forward(
        &self,
        tx: &mpsc::Sender<String>,
        full_text: &mut String,
        resolved: &mut Vec<ResolvedToolCall>,
        context: &mut String,
    ) -> Result<()> {
        let documents = self.documents.list().await?;
        let retrieved = rank(&self.user_message, &documents, self.top_k);
        *context = self.assembler.render_context(&retrieved);
        let messages = self
            .assembler
            .assemble(&retrieved, &self.history, &self.user_message);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.definitions(),
        };
        let pending = self.pump(tx, full_text, request).await?;

        if pending.is_empty() {
            return Ok(());
        }

        debug!(count = pending.len(), "Executing streamed tool calls");
        *resolved = execute_all(&self.tools, &pending).await;
        let followup = fold_tool_results(messages, pending, resolved);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: followup,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: Vec::new(),
        };
        let trailing = self.pump(tx, full_text, request).await?;
        if !trailing.is_empty() {
            warn!("Model declared tool calls in the follow-up pass; ignoring");
        }

        Ok(())
    }

    /// Drain one provider stream, forwarding text chunks in arrival order.
    /// Returns the tool calls frozen on the terminal chunk, if any.
    async fn pump(
        &self,
        tx: &mpsc::Sender<String>,
        full_text: &mut String,
        request: ChatRequest,
    ) -> Result<Vec<ToolCallRequest>> {
        let mut chunks = self.provider.stream(request).await?;
        while let Some(chunk) = chunks.recv().await {
            let chunk = chunk?;
            if let Some(text) = chunk.content {
                full_text.push_str(&text);
                if tx.send(text).await.is_err() {
                    // Consumer disconnected; abandon the upstream stream.
                    return Ok(Vec::new());
                }
            }
            if chunk.done {
                return Ok(chunk.tool_calls);
            }
        }
        Ok(Vec::new())
    }
}
