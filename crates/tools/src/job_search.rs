//! Job listing search tool — stub that returns mock listings.
//!
//! In production this would call the portal's listing API. The stub returns
//! deterministic listings so the tool round-trip can be tested end-to-end
//! without network access.

use async_trait::async_trait;

use chatarbor_core::error::ToolError;
use chatarbor_core::tool::{Tool, ToolResult};

pub struct JobSearchTool;

#[async_trait]
impl Tool for JobSearchTool {
    fn name(&self) -> &str {
        "job_search"
    }

    fn description(&self) -> &str {
        "Search current job listings by role and optional location. Returns title, employer, location, and a listing URL."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "role": {
                    "type": "string",
                    "description": "The job title or keywords to search for"
                },
                "location": {
                    "type": "string",
                    "description": "City or state to search in (optional)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of listings to return (default 3)",
                    "default": 3
                }
            },
            "required": ["role"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let role = arguments["role"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'role' argument".into()))?;

        let location = arguments["location"].as_str().unwrap_or("Remote");
        let limit = arguments["limit"].as_u64().unwrap_or(3).min(10) as usize;

        let listings = generate_mock_listings(role, location, limit);

        Ok(ToolResult {
            success: true,
            output: serde_json::json!({ "listings": listings }),
        })
    }
}

#[derive(serde::Serialize)]
struct JobListing {
    title: String,
    employer: String,
    location: String,
    url: String,
}

/// Generate deterministic mock listings from the role/location text.
fn generate_mock_listings(role: &str, location: &str, limit: usize) -> Vec<JobListing> {
    let employers = [
        "Brightpath Staffing",
        "Northfield Health",
        "Cascade Logistics",
        "Juniper Retail Group",
        "Summit Technical Services",
    ];

    // Simple hash for varied but stable results per role.
    let hash: usize = role
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));

    (0..limit)
        .map(|i| {
            let employer = employers[(hash + i) % employers.len()];
            JobListing {
                title: format!("{role} ({})", if i == 0 { "Full-time" } else { "Part-time" }),
                employer: employer.to_string(),
                location: location.to_string(),
                url: format!(
                    "https://rangamworks.com/JobSeeker/DirectorySearchJob?directory=home&listing={}",
                    (hash + i) % 10_000
                ),
            }
        })
        .collect()
}
