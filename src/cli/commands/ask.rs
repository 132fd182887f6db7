//! Ask command implementation.

use crate::cli::{FilterArgs, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::process::ExitCode;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    k: Option<usize>,
    filters: &FilterArgs,
    settings: Settings,
) -> Result<ExitCode> {
    let k = k.unwrap_or(settings.retrieval.ask_k);
    let spec = filters.to_spec();
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching calls...");
    let answer = orchestrator.ask(question, k, &spec).await;
    spinner.finish_and_clear();

    match answer {
        Ok(Some(answer)) => {
            println!("{}", answer);
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => {
            Output::warning("No matches found. Try increasing --k or removing filters.");
            Ok(ExitCode::from(4))
        }
        Err(e) => {
            Output::error(&format!("Failed to answer: {}", e));
            Err(e.into())
        }
    }
}
