//! Transcript ingestion: parsing transcripts into segments and coalescing them into chunks.

mod chunker;
mod segment;

pub use chunker::{chunk_segments, SegmentChunker, DEFAULT_MAX_CHARS};
pub use segment::{
    call_id_from_path, parse_file, parse_line, parse_str, Segment, TopicFlags,
    COMPETITOR_PATTERNS, PRICING_PATTERNS, SECURITY_PATTERNS,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A scalar metadata value, the only kind of value the vector store accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl MetadataValue {
    /// Convert a JSON value. Returns `None` for non-scalar values, nulls and floats.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(MetadataValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_i64().map(MetadataValue::Int),
            serde_json::Value::String(s) => Some(MetadataValue::Str(s.clone())),
            _ => None,
        }
    }

    /// Convert to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MetadataValue::Bool(b) => serde_json::Value::Bool(*b),
            MetadataValue::Int(i) => serde_json::Value::from(*i),
            MetadataValue::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Int(i) => write!(f, "{}", i),
            MetadataValue::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Flat, scalar-only metadata attached to every stored chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub call_id: String,
    /// Timestamp of the first segment.
    pub start_ts: String,
    /// Timestamp of the last segment.
    pub end_ts: String,
    pub seg_start_idx: usize,
    pub seg_end_idx: usize,
    pub mentions_pricing: bool,
    pub mentions_security: bool,
    pub mentions_competitor: bool,
}

impl ChunkMetadata {
    /// Field names, in storage order.
    pub const FIELDS: [&'static str; 8] = [
        "call_id",
        "start_ts",
        "end_ts",
        "seg_start_idx",
        "seg_end_idx",
        "mentions_pricing",
        "mentions_security",
        "mentions_competitor",
    ];

    /// Look up a field by name.
    pub fn get(&self, field: &str) -> Option<MetadataValue> {
        let value = match field {
            "call_id" => MetadataValue::Str(self.call_id.clone()),
            "start_ts" => MetadataValue::Str(self.start_ts.clone()),
            "end_ts" => MetadataValue::Str(self.end_ts.clone()),
            "seg_start_idx" => MetadataValue::Int(self.seg_start_idx as i64),
            "seg_end_idx" => MetadataValue::Int(self.seg_end_idx as i64),
            "mentions_pricing" => MetadataValue::Bool(self.mentions_pricing),
            "mentions_security" => MetadataValue::Bool(self.mentions_security),
            "mentions_competitor" => MetadataValue::Bool(self.mentions_competitor),
            _ => return None,
        };
        Some(value)
    }
}

/// A coalesced run of segments, ready for the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID, independent of segment IDs.
    pub id: Uuid,
    /// Rendered segment lines joined by newlines.
    pub text: String,
    pub metadata: ChunkMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ChunkMetadata {
        ChunkMetadata {
            call_id: "2_pricing_call".to_string(),
            start_ts: "00:10".to_string(),
            end_ts: "03:40".to_string(),
            seg_start_idx: 1,
            seg_end_idx: 7,
            mentions_pricing: true,
            mentions_security: false,
            mentions_competitor: false,
        }
    }

    #[test]
    fn test_metadata_serializes_flat() {
        let value = serde_json::to_value(metadata()).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj.len(), ChunkMetadata::FIELDS.len());
        assert!(obj.values().all(|v| !v.is_object() && !v.is_array()));
        assert_eq!(obj["seg_end_idx"], serde_json::json!(7));
        assert_eq!(obj["mentions_pricing"], serde_json::json!(true));
    }

    #[test]
    fn test_metadata_get() {
        let meta = metadata();
        assert_eq!(meta.get("call_id"), Some(MetadataValue::from("2_pricing_call")));
        assert_eq!(meta.get("seg_start_idx"), Some(MetadataValue::Int(1)));
        assert_eq!(meta.get("mentions_security"), Some(MetadataValue::Bool(false)));
        assert_eq!(meta.get("speaker"), None);

        for field in ChunkMetadata::FIELDS {
            assert!(meta.get(field).is_some());
        }
    }

    #[test]
    fn test_metadata_value_from_json() {
        assert_eq!(
            MetadataValue::from_json(&serde_json::json!("x")),
            Some(MetadataValue::from("x"))
        );
        assert_eq!(MetadataValue::from_json(&serde_json::json!(3)), Some(MetadataValue::Int(3)));
        assert_eq!(MetadataValue::from_json(&serde_json::json!(true)), Some(MetadataValue::Bool(true)));
        assert_eq!(MetadataValue::from_json(&serde_json::json!([1])), None);
        assert_eq!(MetadataValue::from_json(&serde_json::Value::Null), None);
    }
}
