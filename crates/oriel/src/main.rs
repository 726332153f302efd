//! # oriel
//!
//! Oriel - a window into web front-end source trees.
//!
//! Points the analysis engine at an entry document and reports the
//! features and warnings found across its transitive import graph.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "oriel")]
#[command(about = "Static analyzer for web front-end source trees", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a document and everything it transitively imports
    Analyze(commands::analyze::AnalyzeArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args),
    };
    std::process::exit(exit_code);
}
