//! Filter specifications and their normalization into store-native expressions.

use crate::error::{CallpilotError, Result};
use crate::ingestion::{ChunkMetadata, MetadataValue};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Prefix that marks a key as an operator (`$and`, `$eq`, ...).
pub const OPERATOR_MARKER: char = '$';

/// The metadata field holding the call ID.
pub const CALL_ID_FIELD: &str = "call_id";

/// What a caller asks to filter on.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// Field equality constraints, in insertion order, one value per field.
    Fields(Vec<(String, MetadataValue)>),
    /// An already-native expression, passed to the store unchanged.
    Native(Value),
}

impl Default for FilterSpec {
    fn default() -> Self {
        FilterSpec::Fields(Vec::new())
    }
}

impl FilterSpec {
    /// No filtering.
    pub fn none() -> Self {
        Self::default()
    }

    /// Filter on a single call.
    pub fn for_call(call_id: &str) -> Self {
        Self::none().with(CALL_ID_FIELD, call_id)
    }

    /// Add or replace an equality constraint. A replaced field keeps its position.
    pub fn with(self, field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        let field = field.into();
        let value = value.into();

        match self {
            FilterSpec::Fields(mut fields) => {
                match fields.iter_mut().find(|(f, _)| *f == field) {
                    Some(entry) => entry.1 = value,
                    None => fields.push((field, value)),
                }
                FilterSpec::Fields(fields)
            }
            FilterSpec::Native(Value::Object(mut obj)) => {
                obj.insert(field, value.to_json());
                FilterSpec::Native(Value::Object(obj))
            }
            native => native,
        }
    }

    /// Build a spec from a JSON object.
    ///
    /// Objects with any key starting with `$` are treated as native expressions.
    /// Otherwise every value must be a scalar (string, integer or boolean).
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = match value {
            Value::Null => return Ok(Self::none()),
            Value::Object(obj) => obj,
            other => {
                return Err(CallpilotError::InvalidInput(format!(
                    "filter must be an object, got {}",
                    other
                )))
            }
        };

        if obj.keys().any(|k| k.starts_with(OPERATOR_MARKER)) {
            return Ok(FilterSpec::Native(value.clone()));
        }

        let mut fields = Vec::with_capacity(obj.len());
        for (key, raw) in obj {
            let scalar = MetadataValue::from_json(raw).ok_or_else(|| {
                CallpilotError::InvalidInput(format!(
                    "filter value for '{}' must be a string, integer or boolean",
                    key
                ))
            })?;
            fields.push((key.clone(), scalar));
        }

        Ok(FilterSpec::Fields(fields))
    }

    /// True when the spec imposes no constraint.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterSpec::Fields(fields) => fields.is_empty(),
            FilterSpec::Native(Value::Object(obj)) => obj.is_empty(),
            FilterSpec::Native(Value::Null) => true,
            FilterSpec::Native(_) => false,
        }
    }

    /// The requested call ID, if the spec constrains `call_id` to a string.
    pub fn call_id(&self) -> Option<&str> {
        match self {
            FilterSpec::Fields(fields) => fields.iter().find_map(|(f, v)| match v {
                MetadataValue::Str(s) if f == CALL_ID_FIELD => Some(s.as_str()),
                _ => None,
            }),
            FilterSpec::Native(value) => value.get(CALL_ID_FIELD).and_then(Value::as_str),
        }
    }
}

/// A filter expression in the vector store's native dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereFilter {
    /// `{field: value}`
    Equals { field: String, value: MetadataValue },
    /// `{"$and": [...]}`
    And(Vec<WhereFilter>),
    /// Any expression the caller built directly.
    Native(Value),
}

/// Translate a filter spec into a store expression.
///
/// Empty specs yield `None`, native specs pass through unchanged, a single field
/// becomes a plain equality and several fields become a conjunction.
pub fn normalize(spec: &FilterSpec) -> Option<WhereFilter> {
    if spec.is_empty() {
        return None;
    }

    match spec {
        FilterSpec::Native(value) => Some(WhereFilter::Native(value.clone())),
        FilterSpec::Fields(fields) if fields.len() == 1 => {
            let (field, value) = &fields[0];
            Some(WhereFilter::Equals {
                field: field.clone(),
                value: value.clone(),
            })
        }
        FilterSpec::Fields(fields) => Some(WhereFilter::And(
            fields
                .iter()
                .map(|(field, value)| WhereFilter::Equals {
                    field: field.clone(),
                    value: value.clone(),
                })
                .collect(),
        )),
    }
}

impl WhereFilter {
    /// Render in the store's JSON operator dialect.
    pub fn to_json(&self) -> Value {
        match self {
            WhereFilter::Equals { field, value } => {
                let mut obj = Map::new();
                obj.insert(field.clone(), value.to_json());
                Value::Object(obj)
            }
            WhereFilter::And(clauses) => {
                let mut obj = Map::new();
                obj.insert(
                    "$and".to_string(),
                    Value::Array(clauses.iter().map(WhereFilter::to_json).collect()),
                );
                Value::Object(obj)
            }
            WhereFilter::Native(value) => value.clone(),
        }
    }

    /// Evaluate against stored metadata.
    pub fn matches(&self, meta: &ChunkMetadata) -> bool {
        match self {
            WhereFilter::Equals { field, value } => meta.get(field).as_ref() == Some(value),
            WhereFilter::And(clauses) => clauses.iter().all(|c| c.matches(meta)),
            WhereFilter::Native(expr) => eval_native(expr, meta),
        }
    }
}

/// Evaluate a native expression. Unknown operators and malformed clauses match nothing.
fn eval_native(expr: &Value, meta: &ChunkMetadata) -> bool {
    let Some(obj) = expr.as_object() else {
        return false;
    };

    obj.iter().all(|(key, operand)| match key.as_str() {
        "$and" => operand
            .as_array()
            .is_some_and(|clauses| clauses.iter().all(|c| eval_native(c, meta))),
        "$or" => operand
            .as_array()
            .is_some_and(|clauses| clauses.iter().any(|c| eval_native(c, meta))),
        k if k.starts_with(OPERATOR_MARKER) => false,
        field => eval_field(meta.get(field).as_ref(), operand),
    })
}

fn eval_field(actual: Option<&MetadataValue>, operand: &Value) -> bool {
    let Some(actual) = actual else {
        return false;
    };

    let Some(ops) = operand.as_object() else {
        return scalar_eq(actual, operand);
    };

    ops.iter().all(|(op, target)| match op.as_str() {
        "$eq" => scalar_eq(actual, target),
        "$ne" => !scalar_eq(actual, target),
        "$in" => target
            .as_array()
            .is_some_and(|items| items.iter().any(|t| scalar_eq(actual, t))),
        "$nin" => target
            .as_array()
            .is_some_and(|items| !items.iter().any(|t| scalar_eq(actual, t))),
        "$gt" => compare(actual, target) == Some(Ordering::Greater),
        "$gte" => matches!(compare(actual, target), Some(Ordering::Greater | Ordering::Equal)),
        "$lt" => compare(actual, target) == Some(Ordering::Less),
        "$lte" => matches!(compare(actual, target), Some(Ordering::Less | Ordering::Equal)),
        _ => false,
    })
}

fn scalar_eq(actual: &MetadataValue, target: &Value) -> bool {
    MetadataValue::from_json(target).as_ref() == Some(actual)
}

fn compare(actual: &MetadataValue, target: &Value) -> Option<Ordering> {
    match (actual, target) {
        (MetadataValue::Int(a), Value::Number(n)) => (*a as f64).partial_cmp(&n.as_f64()?),
        (MetadataValue::Str(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(call_id: &str, pricing: bool) -> ChunkMetadata {
        ChunkMetadata {
            call_id: call_id.to_string(),
            start_ts: "00:00".to_string(),
            end_ts: "01:30".to_string(),
            seg_start_idx: 4,
            seg_end_idx: 9,
            mentions_pricing: pricing,
            mentions_security: false,
            mentions_competitor: false,
        }
    }

    #[test]
    fn test_empty_spec_normalizes_to_none() {
        assert_eq!(normalize(&FilterSpec::none()), None);
        assert_eq!(normalize(&FilterSpec::from_json(&json!({})).unwrap()), None);
        assert_eq!(normalize(&FilterSpec::from_json(&Value::Null).unwrap()), None);
    }

    #[test]
    fn test_single_field_passes_through() {
        let spec = FilterSpec::for_call("4_negotiation_call");
        let filter = normalize(&spec).unwrap();

        assert_eq!(
            filter,
            WhereFilter::Equals {
                field: "call_id".to_string(),
                value: MetadataValue::from("4_negotiation_call"),
            }
        );
        assert_eq!(filter.to_json(), json!({"call_id": "4_negotiation_call"}));
    }

    #[test]
    fn test_multiple_fields_become_conjunction() {
        let spec = FilterSpec::for_call("2_pricing_call")
            .with("mentions_pricing", true)
            .with("mentions_security", true);

        let filter = normalize(&spec).unwrap();

        assert_eq!(
            filter.to_json(),
            json!({"$and": [
                {"call_id": "2_pricing_call"},
                {"mentions_pricing": true},
                {"mentions_security": true},
            ]})
        );
        match filter {
            WhereFilter::And(clauses) => assert_eq!(clauses.len(), 3),
            other => panic!("expected conjunction, got {:?}", other),
        }
    }

    #[test]
    fn test_native_expression_passes_through() {
        let raw = json!({"$or": [{"call_id": "a"}, {"call_id": "b"}]});
        let spec = FilterSpec::from_json(&raw).unwrap();

        assert!(matches!(spec, FilterSpec::Native(_)));
        assert_eq!(normalize(&spec).unwrap().to_json(), raw);
    }

    #[test]
    fn test_with_replaces_existing_field() {
        let spec = FilterSpec::for_call("a").with("mentions_pricing", true).with("call_id", "b");
        assert_eq!(
            spec,
            FilterSpec::Fields(vec![
                ("call_id".to_string(), MetadataValue::from("b")),
                ("mentions_pricing".to_string(), MetadataValue::Bool(true)),
            ])
        );
    }

    #[test]
    fn test_from_json_keeps_key_order() {
        let value: Value =
            serde_json::from_str(r#"{"mentions_pricing": true, "call_id": "x"}"#).unwrap();
        let spec = FilterSpec::from_json(&value).unwrap();

        assert_eq!(
            normalize(&spec),
            Some(WhereFilter::And(vec![
                WhereFilter::Equals {
                    field: "mentions_pricing".to_string(),
                    value: MetadataValue::Bool(true),
                },
                WhereFilter::Equals {
                    field: "call_id".to_string(),
                    value: MetadataValue::from("x"),
                },
            ]))
        );
    }

    #[test]
    fn test_from_json_rejects_non_scalar_values() {
        assert!(FilterSpec::from_json(&json!({"call_id": ["a", "b"]})).is_err());
        assert!(FilterSpec::from_json(&json!("call_id")).is_err());
    }

    #[test]
    fn test_call_id_constraint() {
        assert_eq!(FilterSpec::for_call("x").call_id(), Some("x"));
        assert_eq!(FilterSpec::none().with("mentions_pricing", true).call_id(), None);
        assert_eq!(FilterSpec::none().with("call_id", 3_i64).call_id(), None);

        let native = FilterSpec::from_json(&json!({"call_id": "y", "$and": []})).unwrap();
        assert_eq!(native.call_id(), Some("y"));
    }

    #[test]
    fn test_matches_equality_and_conjunction() {
        let filter = normalize(&FilterSpec::for_call("a").with("mentions_pricing", true)).unwrap();

        assert!(filter.matches(&meta("a", true)));
        assert!(!filter.matches(&meta("a", false)));
        assert!(!filter.matches(&meta("b", true)));

        let unknown_field = normalize(&FilterSpec::none().with("speaker", "AE")).unwrap();
        assert!(!unknown_field.matches(&meta("a", true)));
    }

    #[test]
    fn test_matches_native_operators() {
        let m = meta("a", true);

        let or = WhereFilter::Native(json!({"$or": [{"call_id": "b"}, {"call_id": {"$eq": "a"}}]}));
        assert!(or.matches(&m));

        let range = WhereFilter::Native(json!({"$and": [
            {"seg_start_idx": {"$gte": 4}},
            {"seg_end_idx": {"$lt": 10}},
        ]}));
        assert!(range.matches(&m));

        let not_in = WhereFilter::Native(json!({"call_id": {"$nin": ["a", "c"]}}));
        assert!(!not_in.matches(&m));

        let in_list = WhereFilter::Native(json!({"call_id": {"$in": ["a", "c"]}}));
        assert!(in_list.matches(&m));

        let unknown = WhereFilter::Native(json!({"$regex": "a"}));
        assert!(!unknown.matches(&m));
    }
}
