//! The tool seam: capabilities the model can request mid-turn.
//!
//! A `Tool` wraps one externally defined capability behind a name, a
//! description, and a JSON Schema for its arguments. The registry holds the
//! active capability set; `chatarbor-tools` supplies the built-ins and the
//! execution bridge that drives them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// What a tool hands back after running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the invocation succeeded
    pub success: bool,

    /// Structured output, forwarded to the model verbatim
    pub output: serde_json::Value,
}

/// A tool invocation after execution, immutable from here on.
///
/// `result` is either the tool's structured output or an error descriptor
/// shaped `{"error": "Failed to execute {name}: {reason}"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedToolCall {
    /// The model-assigned call ID
    pub id: String,

    /// Name of the tool that was invoked
    pub name: String,

    /// Parsed arguments (empty object when parsing failed)
    pub arguments: serde_json::Value,

    /// Tool output or error descriptor
    pub result: serde_json::Value,
}

/// One capability the assistant can expose to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name, referenced by the model when it calls.
    fn name(&self) -> &str;

    /// What this tool does, in words the model reads.
    fn description(&self) -> &str;

    /// JSON Schema for the arguments this tool accepts.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Run the tool against parsed arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// The wire-facing definition announced to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The set of tools available to a deployment, keyed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. A name collision replaces the earlier tool.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Replacing previously registered tool");
        }
    }

    /// Look a tool up by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Definitions for every registered tool, for the model request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Dispatch one invocation by tool name.
    pub async fn execute(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.execute(arguments).await
    }

    /// Names of all registered tools.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
