//! Evidence retrieval contract — the external collaborator that grounds a
//! debate topic in document snippets.
//!
//! Ranking, latency, and the underlying index are the retriever's concern;
//! the engine only consumes an ordered snippet sequence and folds it into
//! the opening topic framing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One ranked evidence snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceSnippet {
    /// Snippet text.
    pub text: String,
    /// Retriever-assigned relevance score, higher is better.
    pub score: f64,
}

impl EvidenceSnippet {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Capability that returns evidence snippets for a query, best first.
#[async_trait]
pub trait EvidenceRetriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> anyhow::Result<Vec<EvidenceSnippet>>;
}

/// Fold retrieved snippets into the debate topic as grounding context.
/// With no snippets the topic passes through unchanged.
pub fn ground_topic(topic: &str, snippets: &[EvidenceSnippet]) -> String {
    if snippets.is_empty() {
        return topic.to_string();
    }
    let evidence = snippets
        .iter()
        .map(|snippet| format!("- {}", snippet.text))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{topic}\n\nEvidence:\n{evidence}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_topic_without_snippets_passes_through() {
        assert_eq!(ground_topic("Is X ethical?", &[]), "Is X ethical?");
    }

    #[test]
    fn test_ground_topic_appends_evidence_in_order() {
        let snippets = vec![
            EvidenceSnippet::new("X reduced costs by 40%", 0.92),
            EvidenceSnippet::new("X displaced 200 workers", 0.87),
        ];
        let grounded = ground_topic("Is X ethical?", &snippets);
        assert!(grounded.starts_with("Is X ethical?"));
        let costs = grounded.find("reduced costs").unwrap();
        let workers = grounded.find("displaced 200 workers").unwrap();
        assert!(costs < workers);
    }
}
