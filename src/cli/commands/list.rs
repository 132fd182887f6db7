//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::process::ExitCode;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<ExitCode> {
    let orchestrator = Orchestrator::new(settings)?;

    let ids = match orchestrator.list_call_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            Output::error(&format!("Failed to list calls: {}", e));
            return Err(e.into());
        }
    };

    if ids.is_empty() {
        Output::warning("No calls indexed yet. Run: callpilot ingest");
        return Ok(ExitCode::from(3));
    }

    Output::header(&format!("Indexed call IDs ({})", ids.len()));
    for id in &ids {
        Output::list_item(id);
    }

    Ok(ExitCode::SUCCESS)
}
