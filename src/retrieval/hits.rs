//! Mapping raw query results into flat, scored hits.

use crate::ingestion::ChunkMetadata;
use crate::vector_store::QueryResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A normalized search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Not populated by queries; kept for consumers that expect the field.
    pub id: Option<String>,
    pub text: String,
    pub metadata: ChunkMetadata,
    /// `1 - distance`, or `None` when the store returned no usable distance.
    pub score: Option<f64>,
}

/// Similarity score for a raw distance value.
///
/// Numbers and numeric strings are accepted; anything else yields `None`.
pub fn score_from_distance(distance: Option<&Value>) -> Option<f64> {
    let distance = match distance? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Some(1.0 - distance)
}

/// Flatten the first result list of a query into hits, keeping the store's order.
pub fn map_hits(result: QueryResult) -> Vec<Hit> {
    let QueryResult {
        documents,
        metadatas,
        distances,
    } = result;

    let documents = documents.into_iter().next().unwrap_or_default();
    let metadatas = metadatas.into_iter().next().unwrap_or_default();
    let distances = distances.into_iter().next().unwrap_or_default();

    documents
        .into_iter()
        .zip(metadatas)
        .enumerate()
        .map(|(i, (text, metadata))| Hit {
            id: None,
            text,
            metadata,
            score: score_from_distance(distances.get(i)),
        })
        .collect()
}
