//! CLI module for repurpose
//!
//! Provides command-line interface parsing for the repurpose binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use crate::types::{OutputFormat, QueryOptions};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Drug repurposing research orchestrator
///
/// Routes a research question to specialized data workers and merges their
/// findings into one answer, optionally saving a report.
#[derive(Parser, Debug)]
#[command(
    name = "repurpose",
    version,
    about = "Drug repurposing research orchestrator",
    long_about = "Routes a free-text research question to market, trade, patent, clinical,\n\
                  internal and web intelligence workers, then synthesizes their findings\n\
                  into one answer with an optional stored report.",
    after_help = "EXAMPLES:\n    \
                  repurpose query \"Market size for Metformin in Oncology\"\n    \
                  repurpose query \"Patent expiry for Sildenafil\" --report\n    \
                  repurpose query \"Clinical trials for Aspirin\" --format json --stream\n    \
                  repurpose serve --port 8080\n    \
                  repurpose workers"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "repurpose.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a research query and print the synthesized answer
    Query {
        /// Free-text research question
        text: String,

        /// Output format of the final document
        #[arg(short, long, value_enum, default_value = "text")]
        format: FormatArg,

        /// Leave chart descriptors out of the output
        #[arg(long)]
        no_charts: bool,

        /// Leave data tables out of the output
        #[arg(long)]
        no_tables: bool,

        /// Always generate a stored report
        #[arg(short, long)]
        report: bool,

        /// Print one line per pipeline stage while running
        #[arg(short, long)]
        stream: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Host address (overrides the configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides the configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the available workers
    Workers,

    /// Show configuration information
    Config {
        /// Validate the configuration file and exit
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Commands {
    /// Query options for the `query` subcommand
    pub fn query_options(&self) -> Option<QueryOptions> {
        match self {
            Commands::Query {
                format,
                no_charts,
                no_tables,
                report,
                ..
            } => Some(QueryOptions {
                output_format: (*format).into(),
                include_charts: !no_charts,
                include_tables: !no_tables,
                generate_report: *report,
            }),
            _ => None,
        }
    }
}
