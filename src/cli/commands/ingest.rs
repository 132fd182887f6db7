//! Ingest command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{transcript_files, Orchestrator};
use anyhow::Result;
use std::process::ExitCode;

/// Run the ingest command.
pub async fn run_ingest(dir: Option<String>, settings: Settings) -> Result<ExitCode> {
    let dir = dir
        .map(|d| Settings::expand_path(&d))
        .unwrap_or_else(|| settings.transcripts_dir());

    if !dir.is_dir() {
        Output::error(&format!("Missing transcripts directory: {}", dir.display()));
        return Ok(ExitCode::from(1));
    }

    if transcript_files(&dir)?.is_empty() {
        Output::warning(&format!("No .txt files found in {}", dir.display()));
        return Ok(ExitCode::from(2));
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Indexing transcripts...");
    let report = orchestrator.ingest_dir(&dir).await;
    spinner.finish_and_clear();

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    };

    for file in &report.files {
        Output::ingested(&file.file_name, file.segments, file.chunks);
    }
    Output::success(&format!(
        "Done. Upserted {} chunks from {} file(s).",
        report.total_chunks,
        report.files.len()
    ));

    Ok(ExitCode::SUCCESS)
}
