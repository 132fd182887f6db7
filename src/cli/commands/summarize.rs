//! Summarize command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{latest_call_id, Orchestrator};
use anyhow::Result;
use std::process::ExitCode;

/// Run the summarize command.
pub async fn run_summarize(
    call_id: Option<String>,
    last: bool,
    k: Option<usize>,
    settings: Settings,
) -> Result<ExitCode> {
    let mut call_id = call_id.filter(|c| !c.is_empty());

    if last && call_id.is_none() {
        let dir = settings.transcripts_dir();
        match latest_call_id(&dir)? {
            Some(latest) => {
                Output::info(&format!("Most recent transcript: {}", latest));
                call_id = Some(latest);
            }
            None => {
                Output::error(&format!(
                    "No transcripts found. Add files to the '{}' folder.",
                    dir.display()
                ));
                return Ok(ExitCode::from(5));
            }
        }
    }

    let Some(call_id) = call_id else {
        Output::warning("Provide --call-id <id> or use --last");
        return Ok(ExitCode::from(6));
    };

    let k = k.unwrap_or(settings.retrieval.summary_k);
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Summarizing {}...", call_id));
    let summary = orchestrator.summarize(&call_id, k).await;
    spinner.finish_and_clear();

    match summary {
        Ok(Some(summary)) => {
            println!("{}", summary);
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => {
            Output::warning(&format!("No chunks found for call_id '{}'.", call_id));
            Ok(ExitCode::from(7))
        }
        Err(e) => {
            Output::error(&format!("Failed to summarize: {}", e));
            Err(e.into())
        }
    }
}
