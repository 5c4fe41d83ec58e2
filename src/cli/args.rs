//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::HierarchyPath;

/// Server-side row model datasource: paged tree data with simulated latency
#[derive(Parser, Debug)]
#[command(name = "treepager")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Local config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Dataset URL or JSON file (overrides config)
    #[arg(short, long, global = true, env = "TREEPAGER_SOURCE")]
    pub source: Option<String>,

    /// Simulated latency in milliseconds (overrides config)
    #[arg(long, global = true)]
    pub latency_ms: Option<u64>,

    /// Push whole subtrees after each page instead of expanding lazily
    #[arg(long, global = true)]
    pub prefetch: bool,

    /// Answer empty pages with zero rows instead of failing
    #[arg(long, global = true)]
    pub allow_empty_page: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Request one page of rows
    Rows {
        /// Hierarchy path, keys joined by '/' (default: root)
        #[arg(short, long)]
        path: Option<HierarchyPath>,
        /// First row (inclusive)
        #[arg(long, default_value_t = 0)]
        start: usize,
        /// Last row (exclusive, default: start + page_size)
        #[arg(long)]
        end: Option<usize>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Fetch the children of one node
    Expand {
        /// Hierarchy path of the node, keys joined by '/'
        path: HierarchyPath,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the loaded hierarchy as a tree
    Tree,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file locations
    Path,
    /// Print a template config file
    Template,
}
