use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lingo_core::model::{LessonId, UserId};
use services::{AppServices, Clock, load_curriculum};

mod commands;

#[derive(Parser)]
#[command(name = "lingo")]
#[command(about = "Six-week English course: lessons, quizzes and a daily streak")]
#[command(version)]
struct Cli {
    /// SQLite database URL or file path
    #[arg(long, global = true, env = "LINGO_DB_URL", default_value = "sqlite://lingo.sqlite3")]
    db: String,

    /// Signed-in learner; omit to run as a guest (nothing is saved)
    #[arg(long, global = true, env = "LINGO_USER")]
    user: Option<String>,

    /// Curriculum JSON file (defaults to the bundled course)
    #[arg(long, global = true, env = "LINGO_CURRICULUM")]
    curriculum: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show streak, course completion and recent quiz scores
    Status,

    /// List weeks and lessons with completion marks
    Lessons,

    /// Mark a lesson as completed
    Complete { lesson: String },

    /// Answer a lesson's quiz in order and save the score
    Quiz {
        lesson: String,
        /// One answer per question, in order
        #[arg(long = "answer", required = true)]
        answers: Vec<String>,
    },

    /// Save a quiz score that was graded elsewhere
    Score {
        lesson: String,
        #[arg(long)]
        score: u32,
        #[arg(long)]
        total: u32,
    },

    /// Translate the drill sentences from Spanish into English, in order
    Translate {
        /// One translation per sentence; omit to list the sentences
        #[arg(long = "answer")]
        answers: Vec<String>,
    },

    /// Show the suggested 15-minute daily routine
    Routine,
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and parent dirs) so `SQLite` can open it.
fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .with_context(|| format!("invalid --db value: {db_url}"))?;
    let path = path.split('?').next().unwrap_or(path);
    anyhow::ensure!(!path.is_empty(), "invalid --db value: {db_url}");

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn parse_lesson(raw: &str) -> Result<LessonId> {
    LessonId::new(raw).with_context(|| format!("invalid lesson id: {raw:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let curriculum = load_curriculum(cli.curriculum.as_deref())?;
    let user = cli
        .user
        .as_deref()
        .map(UserId::new)
        .transpose()
        .context("invalid --user value")?;

    let db_url = normalize_sqlite_url(&cli.db);
    prepare_sqlite_file(&db_url)?;
    let app = AppServices::new_sqlite(&db_url, Clock::default_clock(), curriculum).await?;
    tracing::debug!(db = %db_url, guest = user.is_none(), "services ready");

    let (mut session, _) = app.open_session(user).await;
    let curriculum = app.curriculum();

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => commands::status(&session, &curriculum, app.progress().today()),
        Commands::Lessons => commands::lessons(&session, &curriculum),
        Commands::Complete { lesson } => {
            let lesson = parse_lesson(&lesson)?;
            commands::complete(&mut session, &curriculum, lesson).await?;
        }
        Commands::Quiz { lesson, answers } => {
            let lesson = parse_lesson(&lesson)?;
            commands::quiz(&mut session, &curriculum, lesson, &answers).await?;
        }
        Commands::Score {
            lesson,
            score,
            total,
        } => {
            let lesson = parse_lesson(&lesson)?;
            commands::score(&mut session, lesson, score, total).await;
        }
        Commands::Translate { answers } => commands::translate(&curriculum, &answers),
        Commands::Routine => commands::routine(&curriculum),
    }

    Ok(())
}
