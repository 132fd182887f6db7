//! CLI module for Callpilot.

pub mod commands;
mod output;

pub use output::Output;

use crate::error::Result;
use crate::retrieval::{FilterSpec, CALL_ID_FIELD};
use clap::{Args, Parser, Subcommand};

/// Callpilot - conversational copilot for sales-call transcripts
///
/// Index call transcripts, then search, ask questions and summarize calls with citations.
#[derive(Parser, Debug)]
#[command(name = "callpilot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "CALLPILOT_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest all .txt transcripts, chunk them and upsert into the vector store
    Ingest {
        /// Transcripts directory (defaults to general.transcripts_dir)
        #[arg(short, long)]
        dir: Option<String>,
    },

    /// List all call IDs currently indexed
    List,

    /// Ask a free-form question over the indexed calls
    Ask {
        /// The question to ask
        question: String,

        /// Number of chunks to retrieve (defaults to retrieval.ask_k)
        #[arg(short, long)]
        k: Option<usize>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Summarize a call by ID, or the most recent transcript with --last
    Summarize {
        /// Call ID to summarize (e.g. 4_negotiation_call)
        #[arg(long)]
        call_id: Option<String>,

        /// Summarize the most recently modified transcript
        #[arg(long)]
        last: bool,

        /// Number of chunks to retrieve (defaults to retrieval.summary_k)
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Search indexed chunks and print scored hits
    Search {
        /// Search query
        query: String,

        /// Maximum number of results (defaults to retrieval.ask_k)
        #[arg(short, long)]
        k: Option<usize>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Raw filter as JSON, e.g. '{"call_id": "2_pricing_call"}' or a $-operator expression
        #[arg(long = "where", value_name = "JSON", conflicts_with_all = ["call_id", "pricing_only", "security_only", "competitor_only"])]
        where_json: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Metadata filters shared by `ask` and `search`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Restrict to one call
    #[arg(long)]
    pub call_id: Option<String>,

    /// Only chunks that mention pricing
    #[arg(long)]
    pub pricing_only: bool,

    /// Only chunks that mention security or compliance
    #[arg(long)]
    pub security_only: bool,

    /// Only chunks that mention competitors
    #[arg(long)]
    pub competitor_only: bool,
}

impl FilterArgs {
    /// Equality constraints for the selected flags. An empty call ID is ignored.
    pub fn to_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec::none();
        if let Some(call_id) = self.call_id.as_deref().filter(|c| !c.is_empty()) {
            spec = spec.with(CALL_ID_FIELD, call_id);
        }
        if self.pricing_only {
            spec = spec.with("mentions_pricing", true);
        }
        if self.security_only {
            spec = spec.with("mentions_security", true);
        }
        if self.competitor_only {
            spec = spec.with("mentions_competitor", true);
        }
        spec
    }
}

/// Parse a `--where` JSON argument into a filter.
pub fn parse_where(json: &str) -> Result<FilterSpec> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    FilterSpec::from_json(&value)
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::MetadataValue;

    #[test]
    fn test_filter_args_to_spec() {
        let args = FilterArgs {
            call_id: Some("4_negotiation_call".to_string()),
            pricing_only: true,
            ..FilterArgs::default()
        };

        let spec = args.to_spec();
        assert_eq!(spec.call_id(), Some("4_negotiation_call"));
        assert_eq!(
            spec,
            FilterSpec::Fields(vec![
                ("call_id".to_string(), MetadataValue::from("4_negotiation_call")),
                ("mentions_pricing".to_string(), MetadataValue::Bool(true)),
            ])
        );

        let empty = FilterArgs {
            call_id: Some(String::new()),
            ..FilterArgs::default()
        };
        assert!(empty.to_spec().is_empty());
    }

    #[test]
    fn test_parse_where() {
        let spec = parse_where(r#"{"call_id": "2_pricing_call"}"#).unwrap();
        assert_eq!(spec.call_id(), Some("2_pricing_call"));

        assert!(parse_where(r#"{"$or": [{"mentions_pricing": true}]}"#).is_ok());
        assert!(parse_where("not json").is_err());
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::parse_from([
            "callpilot",
            "ask",
            "Which competitors came up?",
            "--competitor-only",
            "-k",
            "3",
        ]);
        match cli.command {
            Commands::Ask { question, k, filters } => {
                assert_eq!(question, "Which competitors came up?");
                assert_eq!(k, Some(3));
                assert!(filters.competitor_only);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::parse_from(["callpilot", "-vv", "summarize", "--last"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Summarize { last: true, call_id: None, k: None }));
    }
}
