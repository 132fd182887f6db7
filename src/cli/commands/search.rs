//! Search command implementation.

use crate::cli::{parse_where, FilterArgs, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::process::ExitCode;

/// Run the search command.
pub async fn run_search(
    query: &str,
    k: Option<usize>,
    filters: &FilterArgs,
    where_json: Option<&str>,
    settings: Settings,
) -> Result<ExitCode> {
    let spec = match where_json {
        Some(json) => parse_where(json)?,
        None => filters.to_spec(),
    };
    let k = k.unwrap_or(settings.retrieval.ask_k);
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.search(query, k, &spec).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) => {
            if hits.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", hits.len()));
                for (i, hit) in hits.iter().enumerate() {
                    Output::hit(i + 1, hit);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            Err(e.into())
        }
    }
}
