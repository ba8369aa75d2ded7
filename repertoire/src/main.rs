//! repertoire - chess opening repertoire trainer.
//!
//! Stores named opening lines in SQLite, checks them with a UCI engine to
//! find the move where each line's evaluation swings, and quizzes them on a
//! spaced-repetition schedule.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trainer::Outcome;

mod commands;
mod config;
mod output;
mod persistence;

use commands::eval::DEFAULT_EVAL_DEPTH;
use commands::learn::{LearnOptions, DEFAULT_LEARN_DEPTH, DEFAULT_LEARN_LIMIT};
use commands::review::{QuizOptions, DEFAULT_DUE_LIMIT, DEFAULT_QUIZ_LIMIT, DEFAULT_QUIZ_TOKENS};
use commands::tree::{DEFAULT_TREE_LEVELS, DEFAULT_TREE_LIMIT};
use commands::Context;
use config::EngineSettings;
use persistence::Database;

#[derive(Parser)]
#[command(name = "repertoire", version, about = "Chess opening repertoire trainer")]
struct Cli {
    /// SQLite database path (overrides CHESS_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// UCI engine executable (overrides STOCKFISH_PATH)
    #[arg(long, global = true)]
    engine: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database
    Init,

    /// Add a named line
    Add {
        name: String,
        /// Space-separated SAN moves from the initial position
        #[arg(long)]
        moves: String,
    },

    /// Replace a line's moves; its stored evaluations are dropped
    Edit {
        name: String,
        #[arg(long)]
        moves: String,
    },

    /// Delete a line with its evaluations, card and note
    Delete { name: String },

    /// Import lines from a TSV file (`name<TAB>moves` or bare moves)
    Import {
        file: PathBuf,
        /// Prefix added to every imported name
        #[arg(long, default_value = "")]
        name_prefix: String,
        /// Validate only, insert nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// List stored lines
    List {
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show one line with its final position, note, evaluations and card
    Show { name: String },

    /// Set or replace the mnemonic for a line
    Note {
        name: String,
        #[arg(long)]
        text: String,
    },

    /// Evaluate every ply of one line
    Eval {
        name: String,
        #[arg(
            long,
            default_value_t = DEFAULT_EVAL_DEPTH,
            value_parser = clap::value_parser!(u8).range(1..)
        )]
        depth: u8,
    },

    /// Evaluate every matching line
    EvalAll {
        #[arg(long)]
        prefix: Option<String>,
        #[arg(
            long,
            default_value_t = DEFAULT_EVAL_DEPTH,
            value_parser = clap::value_parser!(u8).range(1..)
        )]
        depth: u8,
    },

    /// Study sheets with critical moves and final evaluations
    Learn {
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long, default_value_t = DEFAULT_LEARN_LIMIT)]
        limit: u32,
        /// Plies per chunk
        #[arg(long, default_value_t = trainer::study::DEFAULT_CHUNK)]
        chunk: usize,
        #[arg(
            long,
            default_value_t = DEFAULT_LEARN_DEPTH,
            value_parser = clap::value_parser!(u8).range(1..)
        )]
        depth: u8,
        /// Centipawn swing that marks a critical move
        #[arg(
            long,
            default_value_t = trainer::critical::DEFAULT_SWING_CP,
            value_parser = clap::value_parser!(i32).range(10..)
        )]
        swing_cp: i32,
        /// Use stored evaluations only
        #[arg(long)]
        no_eval: bool,
        #[arg(long)]
        json: bool,
    },

    /// Branching view of the stored lines
    Tree {
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long, default_value_t = DEFAULT_TREE_LIMIT)]
        limit: u32,
        /// Levels shown below the common start
        #[arg(long, default_value_t = DEFAULT_TREE_LEVELS)]
        levels: u32,
        #[arg(long)]
        json: bool,
    },

    /// Lines due for review
    Due {
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long, default_value_t = DEFAULT_DUE_LIMIT)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },

    /// Quiz due lines and update their schedule
    Quiz {
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long, default_value_t = DEFAULT_QUIZ_LIMIT)]
        limit: usize,
        /// Moves to type per line
        #[arg(long, default_value_t = DEFAULT_QUIZ_TOKENS)]
        tokens: usize,
        /// List the lines a quiz would ask, without prompting or saving
        #[arg(long)]
        dry_run: bool,
        /// Grade every line with this instead of prompting (0-5, pass, fail)
        #[arg(long)]
        grade: Option<Outcome>,
    },
}

/// Log to stderr, and to a daily file when a log directory is configured.
/// The returned guard must live until exit so buffered lines are flushed.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let Some(log_dir) = config::get_log_dir() else {
        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(filter)
            .init();
        return None;
    };

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("warning: cannot create log directory {}: {}", log_dir.display(), e);
    }
    let file_appender = tracing_appender::rolling::daily(&log_dir, "repertoire.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();
    Some(guard)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _guard = init_tracing();
    let cli = Cli::parse();

    let db_path = cli.db.unwrap_or_else(config::get_db_path);
    tracing::debug!("Database: {}", db_path.display());
    let db = Database::open(&db_path)
        .await
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;

    let ctx = Context::new(db, EngineSettings::from_env(cli.engine));
    let result = run(&ctx, cli.command, &db_path).await;
    ctx.db.close().await;
    result
}

async fn run(ctx: &Context, command: Commands, db_path: &std::path::Path) -> Result<()> {
    match command {
        Commands::Init => {
            println!("Database ready at {}", db_path.display());
            Ok(())
        }
        Commands::Add { name, moves } => commands::openings::add(ctx, &name, &moves).await,
        Commands::Edit { name, moves } => commands::openings::edit(ctx, &name, &moves).await,
        Commands::Delete { name } => commands::openings::delete(ctx, &name).await,
        Commands::Import {
            file,
            name_prefix,
            dry_run,
        } => {
            let summary = commands::import::execute(ctx, &file, &name_prefix, dry_run).await?;
            tracing::info!(?summary, "Import finished");
            Ok(())
        }
        Commands::List { prefix, limit } => {
            commands::openings::list(ctx, prefix.as_deref(), limit).await
        }
        Commands::Show { name } => commands::openings::show(ctx, &name).await,
        Commands::Note { name, text } => commands::openings::note(ctx, &name, &text).await,
        Commands::Eval { name, depth } => commands::eval::eval_one(ctx, &name, depth).await,
        Commands::EvalAll { prefix, depth } => {
            commands::eval::eval_all(ctx, prefix.as_deref(), depth).await
        }
        Commands::Learn {
            prefix,
            limit,
            chunk,
            depth,
            swing_cp,
            no_eval,
            json,
        } => {
            let opts = LearnOptions {
                prefix: prefix.as_deref(),
                limit,
                chunk,
                depth,
                swing_cp,
                evaluate: !no_eval,
                json,
            };
            commands::learn::execute(ctx, &opts).await
        }
        Commands::Tree {
            prefix,
            limit,
            levels,
            json,
        } => commands::tree::execute(ctx, prefix.as_deref(), limit, levels, json).await,
        Commands::Due {
            prefix,
            limit,
            json,
        } => commands::review::due(ctx, prefix.as_deref(), limit, json).await,
        Commands::Quiz {
            prefix,
            limit,
            tokens,
            dry_run,
            grade,
        } => {
            let opts = QuizOptions {
                prefix: prefix.as_deref(),
                limit,
                tokens,
                dry_run,
                grade,
            };
            commands::review::quiz(ctx, &opts).await
        }
    }
}
