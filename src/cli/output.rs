//! CLI output formatting utilities.

use crate::rag::shorten;
use crate::retrieval::Hit;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print one ingested file.
    pub fn ingested(file_name: &str, segments: usize, chunks: usize) {
        println!(
            "  {} {}: {} segments -> {} chunks",
            style("*").cyan(),
            style(file_name).bold(),
            segments,
            chunks
        );
    }

    /// Print a search hit.
    pub fn hit(rank: usize, hit: &Hit) {
        let score = hit
            .score
            .map(|s| format!("{:.3}", s))
            .unwrap_or_else(|| "n/a".to_string());
        let m = &hit.metadata;

        println!(
            "\n{} {} {} {} (score: {})",
            style(format!("[{}]", rank)).green(),
            style(&m.call_id).bold(),
            style(format!("{}–{}", m.start_ts, m.end_ts)).cyan(),
            flags(hit),
            score
        );
        println!("   {}", shorten(&hit.text, 200));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Topic flags of a hit, as a compact dimmed tag list.
fn flags(hit: &Hit) -> String {
    let m = &hit.metadata;
    let tags: Vec<&str> = [
        (m.mentions_pricing, "pricing"),
        (m.mentions_security, "security"),
        (m.mentions_competitor, "competitor"),
    ]
    .into_iter()
    .filter_map(|(set, tag)| set.then_some(tag))
    .collect();

    if tags.is_empty() {
        String::new()
    } else {
        style(format!("[{}]", tags.join(", "))).dim().to_string()
    }
}
