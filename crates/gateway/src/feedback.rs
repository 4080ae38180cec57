//! Feedback ratings for assistant responses.
//!
//! A reviewer scores one user-prompt / assistant-response pair against a
//! fixed weighted rubric. Reports live in gateway state for the session's
//! lifetime; exporting them elsewhere is the reviewer tooling's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Rubric dimensions and their weights (out of 100).
pub const RUBRIC_DIMENSIONS: &[(&str, u32)] = &[
    ("Correctness / Accuracy", 20),
    ("Relevance / On-topic", 15),
    ("Completeness", 15),
    ("Clarity / Understandability", 10),
    ("Tone / Empathy / Voice Fit", 10),
    ("Efficiency / Brevity", 5),
    ("Compliance / Scope Adherence", 10),
    ("Context / Memory Handling", 5),
    ("Actionability / Next Steps Provided", 5),
    ("Escalation Appropriateness", 5),
];

/// Each dimension is scored on this scale.
pub const MAX_SCORE: u8 = 5;

/// A submitted feedback rating.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackSubmission {
    pub user_prompt: String,
    pub assistant_response: String,
    /// Dimension name → score (0..=5)
    pub ratings: BTreeMap<String, u8>,
    #[serde(default)]
    pub notes: String,
}

/// A stored feedback report.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackReport {
    pub id: String,
    pub user_prompt: String,
    pub assistant_response: String,
    pub ratings: BTreeMap<String, u8>,
    pub notes: String,
    /// Weighted average on the 0..=5 scale across the scored dimensions.
    pub weighted_score: f32,
    pub submitted_at: DateTime<Utc>,
}

impl FeedbackReport {
    /// Validate a submission against the rubric and freeze it into a report.
    pub fn from_submission(submission: FeedbackSubmission) -> Result<Self, String> {
        if submission.ratings.is_empty() {
            return Err("At least one rubric dimension must be scored".into());
        }

        for (dimension, score) in &submission.ratings {
            if !RUBRIC_DIMENSIONS
                .iter()
                .any(|(name, _)| *name == dimension.as_str())
            {
                return Err(format!("Unknown rubric dimension: '{dimension}'"));
            }
            if *score > MAX_SCORE {
                return Err(format!(
                    "Score for '{dimension}' must be between 0 and {MAX_SCORE}"
                ));
            }
        }

        let weighted_score = weighted_score(&submission.ratings);

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_prompt: submission.user_prompt,
            assistant_response: submission.assistant_response,
            ratings: submission.ratings,
            notes: submission.notes,
            weighted_score,
            submitted_at: Utc::now(),
        })
    }
}

/// Weighted average over the dimensions that were actually scored.
fn weighted_score(ratings: &BTreeMap<String, u8>) -> f32 {
    let mut total_weight = 0u32;
    let mut weighted_sum = 0f32;

    for (name, weight) in RUBRIC_DIMENSIONS {
        if let Some(score) = ratings.get(*name) {
            total_weight += *weight;
            weighted_sum += *weight as f32 * f32::from(*score);
        }
    }

    if total_weight == 0 {
        0.0
    } else {
        weighted_sum / total_weight as f32
    }
}
