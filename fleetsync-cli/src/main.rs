//! Fleetsync: mirror fleet collection status from Datastore to a spreadsheet.
//!
//! # Usage
//!
//! ```text
//! fleetsync run --spreadsheet <id> --project <id> [--expected-upload-interval <secs>]
//!               [--datastore-namespace <ns>] [--prometheus-port <port>]
//!               [--webserver-port <port>] [--access-token <token>] [--log-json]
//! fleetsync render --project <id> [--datastore-namespace <ns>] [--output <path>]
//! ```
//!
//! Every flag can also come from the environment; see `fleetsync run --help`.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{render::RenderArgs, run::RunArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "fleetsync",
    version,
    about = "Publish fleet collection status to a spreadsheet and a status page",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the sync daemon: periodic fetch + upload, status page, metrics.
    Run(RunArgs),

    /// Fetch once and print the status page.
    Render(RenderArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Render(args) => args.run(),
    }
}
