//! Retrieval over indexed chunks: filter normalization, result mapping and search.

pub mod filter;
mod hits;
mod search;

pub use filter::{normalize, FilterSpec, WhereFilter, CALL_ID_FIELD, OPERATOR_MARKER};
pub use hits::{map_hits, score_from_distance, Hit};
pub use search::{list_call_ids, FallbackQuery, PrimaryQuery, Searcher, FALLBACK_MIN_RESULTS};
