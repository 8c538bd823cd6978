use anyhow::Context;
use clap::Parser;
use quiz_core::QuestionBank;
use services::{Clock, QuizServices};
use tracing::debug;

mod cli;
mod commands;
mod logging;

use cli::{Cli, Command, normalize_sqlite_url, prepare_sqlite_file};

/// Sample bank shipped with the binary.
pub(crate) const BUNDLED_BANK: &str = include_str!("../data/questions.json");

fn load_bank(cli: &Cli) -> anyhow::Result<QuestionBank> {
    let Some(path) = &cli.bank else {
        return QuestionBank::from_json(BUNDLED_BANK).context("bundled question bank");
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading question bank {}", path.display()))?;
    QuestionBank::from_json(&raw)
        .with_context(|| format!("loading question bank {}", path.display()))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    logging::init_tracing(&cli.log_level);

    let bank = load_bank(&cli)?;
    let db_url = normalize_sqlite_url(&cli.db_url);
    debug!(db = %db_url, questions = bank.len(), "starting");

    // Keep SQLite file creation in the binary glue so storage stays URL-driven.
    prepare_sqlite_file(&db_url)?;
    let services = QuizServices::new_sqlite(&db_url, Clock::default_clock(), bank)
        .await
        .with_context(|| format!("opening {db_url}"))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Status { json } => commands::status(&services, json, &mut out).await,
        Command::Stages => commands::stages(&services, &mut out).await,
        Command::Quiz { mode, count } => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            commands::quiz(&services, mode, usize::from(count), &mut input, &mut out).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}
