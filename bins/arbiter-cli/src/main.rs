mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arbiter-cli")]
#[command(about = "Arbiter CLI - Grade code against test cases on a Judge0 sandbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a source file against a JSON list of test cases
    Run {
        /// Source file to grade
        #[arg(short, long)]
        source: PathBuf,

        /// Language name (e.g., python, javascript, java, cpp)
        #[arg(short, long, default_value = "python")]
        language: String,

        /// JSON file with the test cases
        #[arg(short, long)]
        tests: PathBuf,

        /// Simulate grading without contacting the backend
        #[arg(long, conflicts_with = "auto")]
        simulate: bool,

        /// Use the backend if healthy, otherwise simulate
        #[arg(long)]
        auto: bool,

        /// Print the full response as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Check whether the execution backend is reachable
    Health,

    /// List configured languages and their backend ids
    Languages {
        /// Query the backend catalog instead of the local table
        #[arg(long, default_value = "false")]
        remote: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source,
            language,
            tests,
            simulate,
            auto,
            json,
        } => {
            let mode = if simulate {
                commands::RunMode::Simulate
            } else if auto {
                commands::RunMode::Auto
            } else {
                commands::RunMode::Execute
            };
            let passed_any = commands::run(&source, &language, &tests, mode, json).await?;
            if !passed_any {
                std::process::exit(1);
            }
        }
        Commands::Health => {
            commands::health().await?;
        }
        Commands::Languages { remote } => {
            commands::languages(remote).await?;
        }
    }

    Ok(())
}
