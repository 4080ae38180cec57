//! Built-in tools and the tool execution bridge for ChatArbor.
//!
//! Tools are the capabilities the model can request mid-turn: searching
//! job listings and looking up support resources. The bridge fans a batch
//! of model-declared calls out concurrently and captures failures per call.

pub mod bridge;
pub mod job_search;
pub mod support_resources;

use chatarbor_core::tool::ToolRegistry;

pub use bridge::execute_all;

/// The registry every deployment starts from: all built-in tools.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(job_search::JobSearchTool));
    registry.register(Box::new(support_resources::SupportResourcesTool));
    registry
}
