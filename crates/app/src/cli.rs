use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use quiz_core::model::Mode;

pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
pub const MEMORY_DB_URL: &str = "sqlite::memory:";

#[derive(Debug, Parser)]
#[command(name = "quiz", version, about = "Adaptive self-study quiz")]
pub struct Cli {
    /// SQLite database URL or file path
    #[arg(long = "db", env = "QUIZ_DB_URL", default_value = DEFAULT_DB_URL, global = true)]
    pub db_url: String,

    /// Question bank JSON file (defaults to the bundled sample bank)
    #[arg(long, env = "QUIZ_BANK_PATH", global = true)]
    pub bank: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "QUIZ_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show score, pass status and what to study next
    Status {
        /// Print the overview as JSON
        #[arg(long)]
        json: bool,
    },

    /// Take a quiz: a stage id (e.g. "basics") or "review"
    Quiz {
        mode: Mode,

        /// Maximum number of questions
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..))]
        count: u16,
    },

    /// List stages with per-stage progress
    Stages,
}

/// Turn a bare path or `sqlite:` URL into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == MEMORY_DB_URL || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directories if missing.
pub fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if db_url == MEMORY_DB_URL {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid --db value: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid --db value: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }

    Ok(())
}
