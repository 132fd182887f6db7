//! CLI command implementations.
//!
//! Each command returns the process exit code; empty states map to distinct non-zero codes.

mod ask;
mod config;
mod ingest;
mod list;
mod search;
mod summarize;

pub use ask::run_ask;
pub use config::run_config;
pub use ingest::run_ingest;
pub use list::run_list;
pub use search::run_search;
pub use summarize::run_summarize;
