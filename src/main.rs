use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wbot::EngineError;
use wbot::config::ServerConfig;
use wbot::consts::DEFAULT_CONFIG_PATH;
use wbot::engine::Engine;
use wbot::engine::process::ProcessEngine;
use wbot::words::{check_word, parse_guesses};

/// Exit status for "try again later" (sysexits EX_TEMPFAIL).
const EXIT_TEMPFAIL: u8 = 75;

#[derive(Parser)]
#[command(name = "wbot", version, about = "Ask the wordsmith solver, politely and in bounded numbers.")]
struct Cli {
    /// Server configuration file
    #[arg(short, long, env = "WBOT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a word, printing one report per turn
    Solve {
        /// Target word
        word: String,
    },
    /// Coach a sequence of guesses against a target word
    Coach {
        /// Target word
        word: String,
        /// Comma-separated guesses, e.g. slate,trace
        guesses: String,
    },
    /// Load the solver's word list
    Words {
        /// Print every word instead of just the count
        #[arg(long, default_value_t = false)]
        print: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            let timed_out = e
                .downcast_ref::<EngineError>()
                .is_some_and(EngineError::is_timeout);
            if timed_out {
                ExitCode::from(EXIT_TEMPFAIL)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!(path = %cli.config.display(), "reading server config");
    let config = ServerConfig::load(&cli.config).context("failed to load server config")?;

    let engine = ProcessEngine::new(&config.engine).context("failed to start engine")?;
    let result = dispatch(&engine, cli.command).await;
    engine.shutdown().await;
    result
}

async fn dispatch(engine: &impl Engine, command: Command) -> Result<()> {
    match command {
        Command::Solve { word } => {
            let word = check_word(&word)?;
            let reports = engine.solve(word).await?;
            print_json(&reports)
        }
        Command::Coach { word, guesses } => {
            let word = check_word(&word)?;
            let guesses = parse_guesses(&guesses)?;
            let report = engine.coach(word, &guesses).await?;
            print_json(&[report])
        }
        Command::Words { print } => {
            let words = engine.word_list().await?;
            info!(count = words.len(), "read words");
            if print {
                for word in &words {
                    println!("{word}");
                }
            } else {
                println!("{}", words.len());
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value).context("failed to encode result")?;
    println!("{json}");
    Ok(())
}
