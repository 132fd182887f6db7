//! Transcript parsing into timestamped speaker segments.
//!
//! Only lines shaped like `[MM:SS] Speaker: text` become segments. Anything else,
//! including blank lines, is skipped without an error.

use crate::error::Result;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Matches `[MM:SS] Speaker: text` on a trimmed line.
static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?P<ts>\d{2}:\d{2})\]\s*(?P<speaker>[^:]+):\s*(?P<text>.+)$")
        .expect("Invalid line regex")
});

/// Pricing keywords. Matched case-insensitively.
pub const PRICING_PATTERNS: &[&str] = &[
    "₹",
    r"\$",
    r"\bprice",
    "pricing",
    "discount",
    "overage",
    "minute",
    "SKU",
    "TCV",
    "ARR",
    "seat",
];

/// Security and compliance keywords. Matched case-insensitively.
pub const SECURITY_PATTERNS: &[&str] = &[
    "SOC",
    "ISO",
    r"pen[- ]?test",
    "DPA",
    "GDPR",
    "DPDPA",
    "KMS",
    "encrypt",
    "SSO",
    "SAML",
    "OIDC",
    "SCIM",
    "retention",
];

/// Competitor keywords. Matched case-insensitively, so any letter may follow "Competitor".
pub const COMPETITOR_PATTERNS: &[&str] = &[r"Competitor\s+[A-Z]", "Brightcall", r"battle-?card"];

struct TopicMatcher {
    pricing: Regex,
    security: Regex,
    competitor: Regex,
}

impl TopicMatcher {
    fn new() -> Self {
        Self {
            pricing: compile_family(PRICING_PATTERNS),
            security: compile_family(SECURITY_PATTERNS),
            competitor: compile_family(COMPETITOR_PATTERNS),
        }
    }

    fn flags_for(&self, text: &str) -> TopicFlags {
        TopicFlags {
            mentions_pricing: self.pricing.is_match(text),
            mentions_security: self.security.is_match(text),
            mentions_competitor: self.competitor.is_match(text),
        }
    }
}

fn compile_family(patterns: &[&str]) -> Regex {
    let alternation = patterns
        .iter()
        .map(|p| format!("(?:{})", p))
        .collect::<Vec<_>>()
        .join("|");

    RegexBuilder::new(&alternation)
        .case_insensitive(true)
        .build()
        .expect("Invalid keyword pattern")
}

static TOPICS: LazyLock<TopicMatcher> = LazyLock::new(TopicMatcher::new);

/// Topical flags computed from an utterance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicFlags {
    pub mentions_pricing: bool,
    pub mentions_security: bool,
    pub mentions_competitor: bool,
}

impl TopicFlags {
    /// Compute flags for a piece of text.
    pub fn detect(text: &str) -> Self {
        TOPICS.flags_for(text)
    }

    /// Logical OR of two flag sets.
    pub fn union(self, other: TopicFlags) -> TopicFlags {
        TopicFlags {
            mentions_pricing: self.mentions_pricing || other.mentions_pricing,
            mentions_security: self.mentions_security || other.mentions_security,
            mentions_competitor: self.mentions_competitor || other.mentions_competitor,
        }
    }
}

/// One speaker turn from a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Unique segment ID.
    pub id: Uuid,
    /// Call this segment belongs to.
    pub call_id: String,
    /// 0-based position among the parsed segments of the call.
    pub idx: usize,
    /// Timestamp as written (`MM:SS`).
    pub timestamp: String,
    pub speaker: String,
    pub text: String,
    pub flags: TopicFlags,
}

impl Segment {
    /// Render as a transcript line: `[timestamp] speaker: text`.
    pub fn render(&self) -> String {
        format!("[{}] {}: {}", self.timestamp, self.speaker, self.text)
    }
}

/// Derive a call ID from a transcript path: the file stem with spaces replaced by underscores.
pub fn call_id_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace(' ', "_"))
        .unwrap_or_default()
}

/// Parse a single line. Returns `None` for blank or malformed lines.
pub fn parse_line(call_id: &str, idx: usize, line: &str) -> Option<Segment> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let caps = LINE_RE.captures(line)?;
    let text = &caps["text"];

    Some(Segment {
        id: Uuid::new_v4(),
        call_id: call_id.to_string(),
        idx,
        timestamp: caps["ts"].trim().to_string(),
        speaker: caps["speaker"].trim().to_string(),
        text: text.trim().to_string(),
        flags: TopicFlags::detect(text),
    })
}

/// Parse transcript text belonging to `call_id`.
pub fn parse_str(call_id: &str, content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();

    for line in content.lines() {
        if let Some(segment) = parse_line(call_id, segments.len(), line) {
            segments.push(segment);
        }
    }

    segments
}

/// Parse a transcript file into ordered segments.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn parse_file(path: &Path) -> Result<Vec<Segment>> {
    let call_id = call_id_from_path(path);
    let content = std::fs::read_to_string(path)?;
    let segments = parse_str(&call_id, &content);

    debug!("Parsed {} segments for call {}", segments.len(), call_id);
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pricing_line() {
        let segments = parse_str("2_pricing_call", "[02:15] AE: Our list price is $500/seat");

        assert_eq!(segments.len(), 1);
        let seg = &segments[0];
        assert_eq!(seg.call_id, "2_pricing_call");
        assert_eq!(seg.idx, 0);
        assert_eq!(seg.timestamp, "02:15");
        assert_eq!(seg.speaker, "AE");
        assert_eq!(seg.text, "Our list price is $500/seat");
        assert!(seg.flags.mentions_pricing);
        assert!(!seg.flags.mentions_security);
        assert!(!seg.flags.mentions_competitor);
    }

    #[test]
    fn test_indices_have_no_gaps() {
        let content = "\
Call notes, not a transcript line
[00:01] AE: Hi there

[00:05] Prospect Jane Doe:   Hello!
00:07 AE: missing brackets
[0:09] AE: one-digit minutes
[00:12] SE: We support SSO via SAML
";
        let segments = parse_str("call", content);

        let indices: Vec<usize> = segments.iter().map(|s| s.idx).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(segments[1].speaker, "Prospect Jane Doe");
        assert_eq!(segments[1].text, "Hello!");
        assert!(segments[2].flags.mentions_security);
    }

    #[test]
    fn test_segment_ids_are_unique() {
        let segments = parse_str("call", "[00:01] A: one\n[00:02] B: two");
        assert_ne!(segments[0].id, segments[1].id);
    }

    #[test]
    fn test_surrounding_whitespace_is_stripped() {
        let segments = parse_str("call", "   [01:00]AE:price talk   ");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].speaker, "AE");
        assert_eq!(segments[0].text, "price talk");
    }

    #[test]
    fn test_topic_flags() {
        assert!(TopicFlags::detect("we can offer a DISCOUNT").mentions_pricing);
        assert!(TopicFlags::detect("Annual ARR target").mentions_pricing);
        assert!(TopicFlags::detect("costs ₹40 per minute").mentions_pricing);
        assert!(TopicFlags::detect("Do you have a recent pen test?").mentions_security);
        assert!(TopicFlags::detect("pen-test report").mentions_security);
        assert!(TopicFlags::detect("data is encrypted at rest").mentions_security);
        assert!(TopicFlags::detect("We looked at Competitor B").mentions_competitor);
        assert!(TopicFlags::detect("the brightcall demo").mentions_competitor);
        assert!(TopicFlags::detect("send the battle-card").mentions_competitor);
        assert!(TopicFlags::detect("a competitor mentioned lower pricing").mentions_competitor);
        assert!(!TopicFlags::detect("competitors").mentions_competitor);
        assert!(!TopicFlags::detect("the competitor 2").mentions_competitor);

        let none = TopicFlags::detect("Thanks everyone, talk soon");
        assert_eq!(none, TopicFlags::default());
    }

    #[test]
    fn test_call_id_from_path() {
        assert_eq!(
            call_id_from_path(Path::new("transcripts/4 negotiation call.txt")),
            "4_negotiation_call"
        );
        assert_eq!(call_id_from_path(Path::new("1_discovery.txt")), "1_discovery");
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("3 security call.txt");
        std::fs::write(&path, "[00:00] AE: Welcome\nnoise\n[00:30] CISO: Send the SOC 2 report\n").unwrap();

        let segments = parse_file(&path).unwrap();
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| s.call_id == "3_security_call"));
        assert!(segments[1].flags.mentions_security);
    }

    #[test]
    fn test_parse_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(parse_file(&dir.path().join("missing.txt")).is_err());
    }
}
