//! Formatting hits for prompts and for the sources block shown to the user.

use crate::retrieval::Hit;

/// Stand-in for the snippet context when nothing was retrieved.
pub const NO_SNIPPETS: &str = "(no relevant snippets retrieved)";

/// Maximum number of sources listed under an answer.
pub const MAX_SOURCES: usize = 5;

/// Width of each source snippet, placeholder included.
pub const MAX_SNIPPET_CHARS: usize = 160;

const SNIPPET_SEPARATOR: &str = "\n\n---\n\n";
const PLACEHOLDER: &str = "…";

/// Format hits as labelled snippet blocks for a prompt.
pub fn format_snippets(hits: &[Hit]) -> String {
    if hits.is_empty() {
        return NO_SNIPPETS.to_string();
    }

    hits.iter()
        .map(|hit| {
            let m = &hit.metadata;
            format!("[{} {}–{}]\n{}", m.call_id, m.start_ts, m.end_ts, hit.text)
        })
        .collect::<Vec<_>>()
        .join(SNIPPET_SEPARATOR)
}

/// Collapse whitespace and cut `text` to at most `width` characters at a word boundary.
///
/// When the text does not fit, whole words are kept and `…` is appended; if not even the
/// first word fits, only `…` is returned.
pub fn shorten(text: &str, width: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let budget = width.saturating_sub(PLACEHOLDER.chars().count());
    let mut kept = String::new();
    let mut len = 0;

    for word in words {
        let word_len = word.chars().count();
        let needed = if kept.is_empty() { word_len } else { len + 1 + word_len };
        if needed > budget {
            break;
        }
        if !kept.is_empty() {
            kept.push(' ');
        }
        kept.push_str(word);
        len = needed;
    }

    kept.push_str(PLACEHOLDER);
    kept
}

/// Append a numbered `Sources:` block built from `hits` to `answer`.
///
/// Without hits the trimmed answer is returned unchanged.
pub fn format_answer_with_sources(answer: &str, hits: &[Hit]) -> String {
    let answer = answer.trim();
    if hits.is_empty() {
        return answer.to_string();
    }

    let lines: Vec<String> = hits
        .iter()
        .take(MAX_SOURCES)
        .enumerate()
        .map(|(i, hit)| {
            let m = &hit.metadata;
            format!(
                "[{}] {}  {}–{}  —  {}",
                i + 1,
                m.call_id,
                m.start_ts,
                m.end_ts,
                shorten(&hit.text, MAX_SNIPPET_CHARS)
            )
        })
        .collect();

    format!("{}\n\nSources:\n{}", answer, lines.join("\n"))
}
