use crate::codec::Encoding;
use crate::session::DataSource;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Parse, format, and persist query builder filter expressions
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file
    #[arg(long, global = true, env = "QUERY_FILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'F', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// When to use colors
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse display tokens into structured filters
    Parse {
        /// Tokens such as "service_name IN cart, shop"
        #[arg(required = true)]
        tokens: Vec<String>,
    },
    /// Turn structured filters (JSON) back into display tokens
    Format {
        /// JSON array of filters or a filter group; read from stdin when omitted
        input: Option<String>,
    },
    /// Encode tokens as a URL query parameter
    Encode {
        #[arg(required = true)]
        tokens: Vec<String>,

        /// Override the configured encoding
        #[arg(short, long, value_enum)]
        encoding: Option<Encoding>,
    },
    /// Decode a URL query parameter back into tokens
    Decode {
        /// Parameter value, or a full query string with --query
        value: String,

        /// Treat VALUE as a whole query string and look up the configured parameter
        #[arg(long)]
        query: bool,

        #[arg(short, long, value_enum)]
        encoding: Option<Encoding>,
    },
    /// Look up suggestions in the configured attribute catalog
    Suggest {
        /// Partial key, or partial value when --key is given. Empty lists
        /// every key plus the configured example queries.
        #[arg(default_value = "")]
        partial: String,

        /// Suggest values for this key instead of keys
        #[arg(short, long)]
        key: Option<String>,

        #[arg(short, long, value_enum)]
        data_source: Option<DataSource>,
    },
    /// Replay a script of search box actions and print the resulting filters
    Replay {
        /// Script file, one action per line
        file: PathBuf,

        #[arg(short, long, value_enum)]
        data_source: Option<DataSource>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl Cli {
    /// Default log filter for the chosen verbosity
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["query-filter", "parse", "a = 1", "-F", "json", "-vv"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.log_level(), "debug");
    }

    #[test]
    fn test_quiet_wins() {
        let cli = Cli::try_parse_from(["query-filter", "-q", "-v", "parse", "a"]).unwrap();
        assert_eq!(cli.log_level(), "error");
    }
}
