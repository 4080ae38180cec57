//! Tool execution bridge.
//!
//! Takes the batch of tool invocations a model turn declared, runs them all
//! concurrently against the registry, and returns one resolved record per
//! call in the input order. A failing call (bad arguments or a tool error)
//! is captured in that call's result and never disturbs its siblings or the
//! surrounding turn.

use futures::future::join_all;
use tracing::warn;

use chatarbor_core::provider::ToolCallRequest;
use chatarbor_core::tool::{ResolvedToolCall, ToolRegistry};

/// Execute every call concurrently; the result order matches the input order.
pub async fn execute_all(
    registry: &ToolRegistry,
    calls: &[ToolCallRequest],
) -> Vec<ResolvedToolCall> {
    join_all(calls.iter().map(|call| execute_one(registry, call))).await
}

async fn execute_one(registry: &ToolRegistry, call: &ToolCallRequest) -> ResolvedToolCall {
    if !call.is_executable() {
        warn!(call_id = %call.id, "Tool call arrived without a name");
        return ResolvedToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: serde_json::json!({}),
            result: error_descriptor(&call.name, "missing tool name"),
        };
    }

    let arguments = match parse_arguments(&call.arguments) {
        Ok(args) => args,
        Err(reason) => {
            warn!(tool = %call.name, %reason, "Tool arguments failed to parse");
            return ResolvedToolCall {
                id: call.id.clone(),
                name: call.name.clone(),
                arguments: serde_json::json!({}),
                result: error_descriptor(&call.name, &reason),
            };
        }
    };

    match registry.execute(&call.name, arguments.clone()).await {
        Ok(result) => ResolvedToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments,
            result: result.output,
        },
        Err(e) => {
            warn!(tool = %call.name, error = %e, "Tool execution failed");
            ResolvedToolCall {
                id: call.id.clone(),
                name: call.name.clone(),
                arguments,
                result: error_descriptor(&call.name, &e.to_string()),
            }
        }
    }
}

/// An empty argument string means "no arguments", not a parse failure.
fn parse_arguments(raw: &str) -> Result<serde_json::Value, String> {
    if raw.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(raw).map_err(|e| e.to_string())
}

fn error_descriptor(name: &str, reason: &str) -> serde_json::Value {
    serde_json::json!({ "error": format!("Failed to execute {name}: {reason}") })
}
