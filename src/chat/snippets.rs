use futures_util::future::join_all;
use log::{debug, error};

use crate::retrieval::{NodeText, ScoredNode};

/// How many retrieved nodes make it into an answer
pub const MAX_SNIPPETS: usize = 3;

pub const NO_POLICY_FOUND: &str = "No relevant policy found in Proweaver's documents.";

/// Extracts the text of the first `MAX_SNIPPETS` nodes and joins the
/// non-empty ones with a blank line.
///
/// Extraction runs concurrently; a node whose text cannot be read counts as
/// empty. Falls back to `NO_POLICY_FOUND` when nothing is left.
pub async fn compose_answer(nodes: &[ScoredNode]) -> String {
    let extractions = nodes.iter().take(MAX_SNIPPETS).enumerate().map(|(rank, scored)| async move {
        match scored.node.text().await {
            Ok(text) => {
                debug!(
                    "Snippet {} (score {}): {} characters",
                    rank + 1,
                    format_score(scored.score),
                    text.len()
                );
                text
            }
            Err(e) => {
                error!("Error processing document {}: {:#}", rank + 1, e);
                String::new()
            }
        }
    });
    let texts = join_all(extractions).await;

    let answer = texts
        .into_iter()
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if answer.is_empty() {
        NO_POLICY_FOUND.to_string()
    } else {
        answer
    }
}

fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "n/a".to_string(), |s| format!("{:.3}", s))
}
