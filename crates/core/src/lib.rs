//! # ChatArbor Core
//!
//! The domain model of the ChatArbor assistant service: messages and
//! sessions, knowledge documents, the provider and tool seams, and the
//! error taxonomy.
//!
//! The seams are traits (`Provider`, `Tool`, `DocumentStore`); concrete
//! implementations live in the sibling crates, which all depend inward on
//! this one. Swapping a backend never touches the orchestration code, and
//! every trait is easy to stub in tests.

pub mod document;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

pub use document::{DocumentStore, KnowledgeDocument};
pub use error::{Error, Result};
pub use message::{ChatMessage, Message, Role, SessionId};
pub use provider::{ChatRequest, Completion, Provider, StreamChunk, ToolCallRequest};
pub use tool::{ResolvedToolCall, Tool, ToolRegistry, ToolResult};
