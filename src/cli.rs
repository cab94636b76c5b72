use clap::{Parser, Subcommand};
use mvgraph_engine::PlaybackMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mvgraph")]
#[command(author, version, about = "Media pipeline graph compiler and runner")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a graph file to canonical text and write it next to the source
    Compile {
        /// Graph file (.xml, .json or .txt)
        #[arg(required = true)]
        input: PathBuf,

        /// Parameter bindings as KEY=VALUE
        #[arg(value_parser = parse_binding)]
        params: Vec<(String, String)>,

        /// Print the canonical text instead of writing it
        #[arg(long)]
        stdout: bool,

        /// Write the canonical text to this path
        #[arg(short, long, conflicts_with = "stdout")]
        output: Option<PathBuf>,
    },

    /// Build and play a graph file until Ctrl-C
    Run {
        /// Graph file (.xml, .json or .txt)
        #[arg(required = true)]
        input: PathBuf,

        /// Parameter bindings as KEY=VALUE
        #[arg(value_parser = parse_binding)]
        params: Vec<(String, String)>,

        /// Playback mode overriding the graph's run directive
        #[arg(short, long)]
        mode: Option<PlaybackMode>,

        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Start the HTTP control server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Graph file to load and build at startup
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Default parameter bindings as KEY=VALUE
        #[arg(value_parser = parse_binding)]
        params: Vec<(String, String)>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

/// Parse a `KEY=VALUE` binding.
fn parse_binding(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("missing key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
