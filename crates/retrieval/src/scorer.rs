//! Keyword-overlap relevance scoring.
//!
//! This is a heuristic, not a semantic search: it misses documents whose
//! relevant content shares no literal vocabulary with the query, and short
//! common words below the length threshold can still produce false
//! positives. Scoring: each distinct query token longer than two characters
//! adds 1 when found in the document content and 2 when found in the title,
//! biasing ranking toward topical documents.

use std::collections::BTreeSet;

use chatarbor_core::document::KnowledgeDocument;

/// Query tokens at or below this length are treated as noise.
const MIN_TOKEN_LEN: usize = 2;

/// Content-match weight per distinct token.
const CONTENT_WEIGHT: u32 = 1;

/// Title-match weight per distinct token.
const TITLE_WEIGHT: u32 = 2;

/// Rank `documents` against `query` and return the `top_k` best matches.
///
/// Zero-scoring documents are never returned. Ties keep the input order
/// (stable sort), so earlier documents win on equal score.
pub fn rank(
    query: &str,
    documents: &[KnowledgeDocument],
    top_k: usize,
) -> Vec<KnowledgeDocument> {
    let tokens: BTreeSet<String> = query
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() > MIN_TOKEN_LEN)
        .collect();

    if tokens.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(u32, &KnowledgeDocument)> = documents
        .iter()
        .filter_map(|doc| {
            let score = score_document(&tokens, doc);
            (score > 0).then_some((score, doc))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(top_k)
        .map(|(_, doc)| doc.clone())
        .collect()
}

fn score_document(tokens: &BTreeSet<String>, doc: &KnowledgeDocument) -> u32 {
    let content = doc.content.to_lowercase();
    let title = doc.title.to_lowercase();

    let mut score = 0;
    for token in tokens {
        if content.contains(token.as_str()) {
            score += CONTENT_WEIGHT;
        }
        if title.contains(token.as_str()) {
            score += TITLE_WEIGHT;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str, content: &str) -> KnowledgeDocument {
        KnowledgeDocument::new(title, content)
    }

    #[test]
    fn matching_document_is_returned() {
        let docs = vec![doc("Job search basics", "Start your job search with a plan.")];
        let ranked = rank("How do I find a job?", &docs, 2);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].title, "Job search basics");
    }

    #[test]
    fn zero_score_documents_excluded() {
        let docs = vec![
            doc("Resume tips", "Keep your resume short."),
            doc("Cooking", "Preheat the oven to 200 degrees."),
        ];
        let ranked = rank("resume advice", &docs, 5);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].title, "Resume tips");
    }

    #[test]
    fn more_distinct_tokens_ranks_higher() {
        let docs = vec![
            doc("A", "interview preparation"),
            doc("B", "interview preparation and salary negotiation tips"),
        ];
        let ranked = rank("interview salary negotiation", &docs, 2);
        assert_eq!(ranked[0].title, "B");
        assert_eq!(ranked[1].title, "A");
    }

    #[test]
    fn title_match_outweighs_single_content_match() {
        let docs = vec![
            doc("Unrelated", "the interview went well"),
            doc("Interview guide", "general advice"),
        ];
        let ranked = rank("interview", &docs, 2);
        // Title bonus (2) beats the content-only match (1)
        assert_eq!(ranked[0].title, "Interview guide");
    }

    #[test]
    fn title_only_match_still_included() {
        let docs = vec![doc("Benefits overview", "Nothing relevant in the body.")];
        let ranked = rank("benefits", &docs, 2);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn short_tokens_are_noise() {
        let docs = vec![doc("A", "an is to of")];
        assert!(rank("an is to", &docs, 2).is_empty());
    }

    #[test]
    fn empty_inputs_produce_empty_output() {
        assert!(rank("", &[doc("A", "text")], 2).is_empty());
        assert!(rank("query words here", &[], 2).is_empty());
    }

    #[test]
    fn top_k_bound_respected() {
        let docs: Vec<_> = (0..5)
            .map(|i| doc(&format!("Doc {i}"), "career change guidance"))
            .collect();
        let ranked = rank("career change", &docs, 2);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn ties_keep_input_order() {
        let docs = vec![
            doc("First", "relocation support"),
            doc("Second", "relocation support"),
        ];
        let ranked = rank("relocation", &docs, 2);
        assert_eq!(ranked[0].title, "First");
        assert_eq!(ranked[1].title, "Second");
    }

    #[test]
    fn duplicate_query_tokens_count_once() {
        let docs = vec![
            doc("A", "training programs"),
            doc("B", "training programs and training schedules"),
        ];
        // "training training" collapses to one distinct token; both score 1
        let ranked = rank("training training", &docs, 2);
        assert_eq!(ranked[0].title, "A");
    }
}
