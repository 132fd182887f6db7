//! Search orchestration with a call-scoped fallback.
//!
//! A search runs a filtered [`PrimaryQuery`]. If that comes back empty and the
//! filter names a call ID, a [`FallbackQuery`] over-fetches without a filter and
//! keeps only that call's hits, preserving the store's ranking.

use super::filter::{normalize, FilterSpec, WhereFilter};
use super::hits::{map_hits, Hit};
use crate::error::Result;
use crate::vector_store::VectorStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Minimum candidate pool for the unfiltered fallback query.
pub const FALLBACK_MIN_RESULTS: usize = 12;

/// The filtered first attempt.
#[derive(Debug, Clone)]
pub struct PrimaryQuery {
    filter: Option<WhereFilter>,
}

impl PrimaryQuery {
    pub fn new(spec: &FilterSpec) -> Self {
        Self {
            filter: normalize(spec),
        }
    }

    /// The normalized filter sent to the store.
    pub fn filter(&self) -> Option<&WhereFilter> {
        self.filter.as_ref()
    }

    pub async fn run(&self, store: &dyn VectorStore, query: &str, k: usize) -> Result<Vec<Hit>> {
        let result = store.query(query, k, self.filter.as_ref()).await?;
        Ok(map_hits(result))
    }
}

/// Unfiltered retry that filters by call ID on the client side.
#[derive(Debug, Clone)]
pub struct FallbackQuery {
    call_id: String,
}

impl FallbackQuery {
    /// Only specs that constrain `call_id` to a string get a fallback.
    pub fn for_spec(spec: &FilterSpec) -> Option<Self> {
        spec.call_id().map(|call_id| Self {
            call_id: call_id.to_string(),
        })
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Number of unfiltered candidates fetched for a request of `k` hits.
    pub fn candidate_count(k: usize) -> usize {
        k.max(FALLBACK_MIN_RESULTS)
    }

    pub async fn run(&self, store: &dyn VectorStore, query: &str, k: usize) -> Result<Vec<Hit>> {
        let result = store.query(query, Self::candidate_count(k), None).await?;

        Ok(map_hits(result)
            .into_iter()
            .filter(|hit| hit.metadata.call_id == self.call_id)
            .take(k)
            .collect())
    }
}

/// Runs searches against a vector store.
#[derive(Clone)]
pub struct Searcher {
    store: Arc<dyn VectorStore>,
}

impl Searcher {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Return at most `k` hits for `query`, honoring `spec`.
    #[instrument(skip(self, spec), fields(query = %query))]
    pub async fn search(&self, query: &str, k: usize, spec: &FilterSpec) -> Result<Vec<Hit>> {
        let primary = PrimaryQuery::new(spec);
        let hits = primary.run(self.store.as_ref(), query, k).await?;

        if !hits.is_empty() {
            debug!("Primary query returned {} hits", hits.len());
            return Ok(hits);
        }

        match FallbackQuery::for_spec(spec) {
            Some(fallback) => {
                info!(
                    "Filtered query returned nothing, retrying unfiltered for call {}",
                    fallback.call_id()
                );
                fallback.run(self.store.as_ref(), query, k).await
            }
            None => Ok(hits),
        }
    }

    /// Distinct call IDs present in the store.
    pub async fn list_call_ids(&self) -> Result<Vec<String>> {
        list_call_ids(self.store.as_ref()).await
    }
}

/// Distinct, sorted call IDs present in the store. Empty IDs are ignored.
pub async fn list_call_ids(store: &dyn VectorStore) -> Result<Vec<String>> {
    let ids: BTreeSet<String> = store
        .get_all_metadata()
        .await?
        .into_iter()
        .map(|m| m.call_id)
        .filter(|id| !id.is_empty())
        .collect();

    Ok(ids.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CallpilotError;
    use crate::ingestion::{Chunk, ChunkMetadata};
    use crate::vector_store::QueryResult;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// A store with a fixed ranking whose metadata filtering can be made to fail.
    struct ScriptedStore {
        ranked: Vec<ChunkMetadata>,
        ignore_filtered: bool,
        calls: Mutex<Vec<(usize, Option<WhereFilter>)>>,
    }

    impl ScriptedStore {
        fn new(call_ids: &[&str], ignore_filtered: bool) -> Self {
            let ranked = call_ids
                .iter()
                .enumerate()
                .map(|(i, call_id)| ChunkMetadata {
                    call_id: call_id.to_string(),
                    start_ts: format!("{:02}:00", i),
                    end_ts: format!("{:02}:30", i),
                    seg_start_idx: i,
                    seg_end_idx: i,
                    mentions_pricing: i % 2 == 0,
                    mentions_security: false,
                    mentions_competitor: false,
                })
                .collect();

            Self {
                ranked,
                ignore_filtered,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(usize, Option<WhereFilter>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VectorStore for ScriptedStore {
        async fn upsert(&self, chunks: &[Chunk]) -> Result<usize> {
            Ok(chunks.len())
        }

        async fn query(
            &self,
            _query_text: &str,
            n_results: usize,
            filter: Option<&WhereFilter>,
        ) -> Result<QueryResult> {
            self.calls.lock().unwrap().push((n_results, filter.cloned()));

            if self.ignore_filtered && filter.is_some() {
                return Ok(QueryResult::empty());
            }

            let rows: Vec<(usize, ChunkMetadata)> = self
                .ranked
                .iter()
                .cloned()
                .enumerate()
                .filter(|(_, m)| filter.map_or(true, |f| f.matches(m)))
                .take(n_results)
                .collect();

            Ok(QueryResult {
                documents: vec![rows.iter().map(|(i, _)| format!("doc {}", i)).collect()],
                metadatas: vec![rows.iter().map(|(_, m)| m.clone()).collect()],
                distances: vec![rows.iter().map(|(i, _)| json!(*i as f64 / 100.0)).collect()],
            })
        }

        async fn get_all_metadata(&self) -> Result<Vec<ChunkMetadata>> {
            Ok(self.ranked.clone())
        }

        async fn count(&self) -> Result<usize> {
            Ok(self.ranked.len())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl VectorStore for FailingStore {
        async fn upsert(&self, _chunks: &[Chunk]) -> Result<usize> {
            Err(CallpilotError::VectorStore("down".to_string()))
        }

        async fn query(&self, _: &str, _: usize, _: Option<&WhereFilter>) -> Result<QueryResult> {
            Err(CallpilotError::VectorStore("down".to_string()))
        }

        async fn get_all_metadata(&self) -> Result<Vec<ChunkMetadata>> {
            Err(CallpilotError::VectorStore("down".to_string()))
        }

        async fn count(&self) -> Result<usize> {
            Err(CallpilotError::VectorStore("down".to_string()))
        }
    }

    fn negotiation_store(ignore_filtered: bool) -> Arc<ScriptedStore> {
        let mut ids = vec!["1_discovery_call"; 10];
        ids.extend(["4_negotiation_call"; 6]);
        ids.insert(3, "4_negotiation_call");
        Arc::new(ScriptedStore::new(&ids, ignore_filtered))
    }

    #[tokio::test]
    async fn test_primary_hits_skip_fallback() {
        let store = negotiation_store(false);
        let searcher = Searcher::new(store.clone());

        let hits = searcher
            .search("pricing", 3, &FilterSpec::for_call("4_negotiation_call"))
            .await
            .unwrap();

        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.metadata.call_id == "4_negotiation_call"));
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_filters_unfiltered_results() {
        let store = negotiation_store(true);
        let searcher = Searcher::new(store.clone());

        let hits = searcher
            .search("pricing", 4, &FilterSpec::for_call("4_negotiation_call"))
            .await
            .unwrap();

        let calls = store.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].1.is_some());
        assert_eq!(calls[1], (FALLBACK_MIN_RESULTS, None));

        // Ranked positions 3 and 11 are the only matches within the first 12.
        let order: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(order, vec!["doc 3", "doc 11"]);
        assert!(hits.iter().all(|h| h.metadata.call_id == "4_negotiation_call"));
    }

    #[tokio::test]
    async fn test_fallback_truncates_to_k() {
        let store = negotiation_store(true);
        let searcher = Searcher::new(store.clone());

        let hits = searcher
            .search("pricing", 1, &FilterSpec::for_call("4_negotiation_call"))
            .await
            .unwrap();

        assert_eq!(store.calls()[1].0, FALLBACK_MIN_RESULTS);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "doc 3");
    }

    #[tokio::test]
    async fn test_fallback_widens_to_k_when_larger() {
        let store = negotiation_store(true);
        let searcher = Searcher::new(store.clone());

        let hits = searcher
            .search("pricing", 20, &FilterSpec::for_call("4_negotiation_call"))
            .await
            .unwrap();

        assert_eq!(store.calls()[1].0, 20);
        assert_eq!(hits.len(), 7);
    }

    #[tokio::test]
    async fn test_no_fallback_without_call_id() {
        let store = negotiation_store(true);
        let searcher = Searcher::new(store.clone());

        let hits = searcher
            .search("pricing", 4, &FilterSpec::none().with("mentions_pricing", true))
            .await
            .unwrap();

        assert!(hits.is_empty());
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_genuinely_empty_call_stays_empty() {
        let store = negotiation_store(true);
        let searcher = Searcher::new(store.clone());

        let hits = searcher
            .search("pricing", 4, &FilterSpec::for_call("9_unknown_call"))
            .await
            .unwrap();

        assert!(hits.is_empty());
        assert_eq!(store.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_never_more_than_k() {
        let store = negotiation_store(false);
        let searcher = Searcher::new(store);

        for k in [0, 1, 5, 12, 40] {
            let unfiltered = searcher.search("q", k, &FilterSpec::none()).await.unwrap();
            assert!(unfiltered.len() <= k);

            let scoped = searcher
                .search("q", k, &FilterSpec::for_call("1_discovery_call"))
                .await
                .unwrap();
            assert!(scoped.len() <= k);
        }
    }

    #[tokio::test]
    async fn test_unfiltered_search_sends_no_filter() {
        let store = negotiation_store(false);
        let searcher = Searcher::new(store.clone());

        let hits = searcher.search("q", 5, &FilterSpec::none()).await.unwrap();

        assert_eq!(hits.len(), 5);
        assert_eq!(store.calls(), vec![(5, None)]);
        assert_eq!(hits[0].score, Some(1.0));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let searcher = Searcher::new(Arc::new(FailingStore));
        let err = searcher.search("q", 3, &FilterSpec::none()).await.unwrap_err();
        assert!(matches!(err, CallpilotError::VectorStore(_)));
        assert!(searcher.list_call_ids().await.is_err());
    }

    #[tokio::test]
    async fn test_list_call_ids_sorted_and_deduplicated() {
        let store = ScriptedStore::new(&["b_call", "a_call", "", "b_call"], false);
        let ids = list_call_ids(&store).await.unwrap();
        assert_eq!(ids, vec!["a_call".to_string(), "b_call".to_string()]);
    }
}
