//! CLI argument definitions using clap
//!
//! Commands:
//! - cardquery query [--config <path>] [--sort <order>] [--desc] <query>
//! - cardquery parse <query>
//! - cardquery bench [--config <path>] [--iterations <n>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cardquery - search a trading-card catalog with a compact query language
#[derive(Parser, Debug)]
#[command(name = "cardquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a query and print the matching card names
    Query {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding the card data, overrides the configuration
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Result order: name, cmc or released_at
        #[arg(long)]
        sort: Option<String>,

        /// Return results in descending order
        #[arg(long)]
        desc: bool,

        /// Restrict results to a predefined card pool
        #[arg(long)]
        pool: Option<String>,

        /// Define a subset usable as `subset:NAME`; later definitions may use earlier ones
        #[arg(long = "subset", value_name = "NAME=QUERY")]
        subsets: Vec<String>,

        /// Query text
        query: String,
    },

    /// Print the simplified condition tree, its properties and its hash
    Parse {
        /// Define a subset usable as `subset:NAME`
        #[arg(long = "subset", value_name = "NAME=QUERY")]
        subsets: Vec<String>,

        /// Query text
        query: String,
    },

    /// Time full catalog scans with every version-set implementation
    Bench {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding the card data, overrides the configuration
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Scans per implementation and query
        #[arg(long, default_value_t = 10)]
        iterations: u32,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_arguments() {
        let cli = Cli::try_parse_from([
            "cardquery",
            "query",
            "--sort",
            "cmc",
            "--desc",
            "--subset",
            "Simple=\"Mana Matrix\"",
            "subset:Simple",
        ])
        .unwrap();

        match cli.command {
            Command::Query {
                sort,
                desc,
                subsets,
                query,
                ..
            } => {
                assert_eq!(sort.as_deref(), Some("cmc"));
                assert!(desc);
                assert_eq!(subsets, vec!["Simple=\"Mana Matrix\"".to_string()]);
                assert_eq!(query, "subset:Simple");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bench_defaults() {
        let cli = Cli::try_parse_from(["cardquery", "bench"]).unwrap();
        assert!(matches!(cli.command, Command::Bench { iterations: 10, .. }));
    }
}
