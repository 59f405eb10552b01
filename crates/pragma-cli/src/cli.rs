use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pragma",
    about = "PragmaDB: an in-memory, revisioned document store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the PragmaDB HTTP server
    Serve(ServeArgs),
    /// Print the contents of a Ketchup snapshot file
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on (overrides the config file)
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Snapshot files to install as collections before serving
    #[arg(long, num_args = 1..)]
    pub import: Vec<PathBuf>,
    /// Seed the `test` demo collection
    #[arg(long)]
    pub demo: bool,
}

#[derive(Args)]
pub struct InspectArgs {
    pub file: PathBuf,
    /// List every stored revision, not only current ones
    #[arg(long)]
    pub revisions: bool,
}
