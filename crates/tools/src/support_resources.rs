//! Support resource lookup tool.
//!
//! Maps a help topic to the right portal page so the assistant can hand the
//! user a working link instead of guessing one.

use async_trait::async_trait;

use chatarbor_core::error::ToolError;
use chatarbor_core::tool::{Tool, ToolResult};

const CONTACT_URL: &str = "https://rangamworks.com/portal/home/contact";
const JOB_SEARCH_URL: &str =
    "https://rangamworks.com/JobSeeker/DirectorySearchJob?directory=home";
const ABOUT_URL: &str = "https://rangamworks.com/portal/home/about";

pub struct SupportResourcesTool;

#[async_trait]
impl Tool for SupportResourcesTool {
    fn name(&self) -> &str {
        "support_resources"
    }

    fn description(&self) -> &str {
        "Look up the portal page for a help topic: contacting support, searching jobs, or learning about services."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "topic": {
                    "type": "string",
                    "enum": ["contact", "jobs", "about"],
                    "description": "Which resource the user needs"
                }
            },
            "required": ["topic"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let topic = arguments["topic"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'topic' argument".into()))?;

        let (label, url) = match topic {
            "contact" => ("Contact Support", CONTACT_URL),
            "jobs" => ("Job Search Page", JOB_SEARCH_URL),
            "about" => ("About Our Services", ABOUT_URL),
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "Unknown topic: '{other}'. Use 'contact', 'jobs', or 'about'."
                )));
            }
        };

        Ok(ToolResult {
            success: true,
            output: serde_json::json!({ "label": label, "url": url }),
        })
    }
}
