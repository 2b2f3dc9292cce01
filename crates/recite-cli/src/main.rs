//! Recite CLI
//!
//! Command-line front end for the recite study engine: manage contexts,
//! import generated cards, and work through due reviews.

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use recite_core::{sm2, Card, CardKind, Grade, NewCard, NewContext, Store};

/// Recite - context-based spaced-repetition study
#[derive(Parser)]
#[command(name = "recite")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Study flashcards for real-life contexts on an SM-2 schedule")]
struct Cli {
    /// Database path (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Owner identity; every command is scoped to this user
    #[arg(long, global = true, default_value = "default")]
    owner: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List your contexts with due/total card counts
    Contexts,

    /// Create a study context
    AddContext {
        /// Short scenario title, e.g. "airport check-in"
        #[arg(long)]
        title: String,
        /// CEFR-style level label (A1..C2)
        #[arg(long, default_value = "B1")]
        level: String,
        /// Free-form scenario description
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a context and all of its cards
    RemoveContext {
        /// Context id
        context_id: String,
    },

    /// Import generated candidate cards into a context
    Import {
        /// Context id
        context_id: String,
        /// JSON file holding an array of candidate cards
        #[arg(long)]
        file: PathBuf,
    },

    /// Show the next card due for review
    Due {
        /// Restrict to one context
        #[arg(long)]
        context: Option<String>,
    },

    /// Submit a graded review for a card
    Review {
        /// Card id
        card_id: String,
        /// Recall quality: 0=again, 3=hard, 4=good, 5=easy
        quality: i64,
    },

    /// Preview a schedule without touching storage
    Preview {
        /// Current ease factor
        #[arg(long, default_value_t = recite_core::STARTING_EASE)]
        ease: f64,
        /// Current interval in days
        #[arg(long, default_value_t = 0)]
        interval: i64,
        /// Recall quality: 0=again, 3=hard, 4=good, 5=easy
        #[arg(long)]
        quality: i64,
    },

    /// Show the review history for a card
    History {
        /// Card id
        card_id: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let owner = cli.owner;

    match cli.command {
        Commands::Contexts => run_contexts(cli.db, &owner),
        Commands::AddContext {
            title,
            level,
            notes,
        } => run_add_context(cli.db, &owner, title, level, notes),
        Commands::RemoveContext { context_id } => run_remove_context(cli.db, &owner, &context_id),
        Commands::Import { context_id, file } => run_import(cli.db, &owner, &context_id, file),
        Commands::Due { context } => run_due(cli.db, &owner, context.as_deref()),
        Commands::Review { card_id, quality } => run_review(cli.db, &owner, &card_id, quality),
        Commands::Preview {
            ease,
            interval,
            quality,
        } => run_preview(ease, interval, quality),
        Commands::History { card_id } => run_history(cli.db, &owner, &card_id),
    }
}

fn run_contexts(db: Option<PathBuf>, owner: &str) -> anyhow::Result<()> {
    let store = Store::new(db)?;
    let summaries = store.list_contexts(owner)?;

    if summaries.is_empty() {
        println!("{}", "No contexts yet. Create one with add-context.".dimmed());
        return Ok(());
    }

    for summary in &summaries {
        let due = if summary.due_count > 0 {
            format!("{} due", summary.due_count).yellow().bold()
        } else {
            "up to date".green()
        };
        println!(
            "{}  {} ({})  {} cards, {}",
            summary.context.id.dimmed(),
            summary.context.title.white().bold(),
            summary.context.level,
            summary.total_cards,
            due,
        );
    }
    println!();
    println!(
        "{}: {}",
        "Total due".white().bold(),
        store.due_count(owner, None)?
    );
    Ok(())
}

fn run_add_context(
    db: Option<PathBuf>,
    owner: &str,
    title: String,
    level: String,
    notes: Option<String>,
) -> anyhow::Result<()> {
    let store = Store::new(db)?;
    let context = store.create_context(
        owner,
        NewContext {
            title,
            level,
            notes,
        },
    )?;

    println!(
        "{} {} ({})",
        "Created context".green().bold(),
        context.title,
        context.id
    );
    Ok(())
}

fn run_remove_context(db: Option<PathBuf>, owner: &str, context_id: &str) -> anyhow::Result<()> {
    let store = Store::new(db)?;
    if store.delete_context(owner, context_id)? {
        println!("{} {}", "Removed context".green().bold(), context_id);
    } else {
        anyhow::bail!("context not found: {context_id}");
    }
    Ok(())
}

fn run_import(
    db: Option<PathBuf>,
    owner: &str,
    context_id: &str,
    file: PathBuf,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading {}", file.display()))?;
    let cards: Vec<NewCard> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing candidate cards from {}", file.display()))?;

    let store = Store::new(db)?;
    let stats = store.add_cards(owner, context_id, cards)?;

    println!(
        "{}: {} cloze, {} vocab ({} skipped as duplicates)",
        "Imported".green().bold(),
        stats.created_cloze,
        stats.created_vocab,
        stats.skipped,
    );
    Ok(())
}

fn run_due(db: Option<PathBuf>, owner: &str, context: Option<&str>) -> anyhow::Result<()> {
    let store = Store::new(db)?;

    let Some(card) = store.next_due(owner, context)? else {
        println!("{}", "Nothing due. Come back later.".green());
        return Ok(());
    };

    print_card(&card);
    println!();
    println!(
        "{}",
        format!(
            "Answer, then grade it: recite review {} <0|3|4|5>",
            card.id
        )
        .dimmed()
    );
    Ok(())
}

fn run_review(db: Option<PathBuf>, owner: &str, card_id: &str, quality: i64) -> anyhow::Result<()> {
    let grade = Grade::from_quality(quality)
        .ok_or_else(|| anyhow::anyhow!("quality must be one of 0, 3, 4, 5 (got {quality})"))?;

    let store = Store::new(db)?;
    let outcome = store.submit_review(owner, card_id, grade)?;
    println!(
        "{} {} — next due {} (interval {} {}, ease {:.2})",
        "Recorded".green().bold(),
        grade.as_str().white().bold(),
        outcome.next_due.format("%Y-%m-%d").to_string().cyan(),
        outcome.interval,
        if outcome.interval == 1 { "day" } else { "days" },
        outcome.ease,
    );
    Ok(())
}

fn run_preview(ease: f64, interval: i64, quality: i64) -> anyhow::Result<()> {
    let grade = Grade::from_quality(quality)
        .ok_or_else(|| anyhow::anyhow!("quality must be one of 0, 3, 4, 5 (got {quality})"))?;

    let schedule = sm2::next_schedule(ease, interval, grade, Utc::now());
    println!(
        "ease {:.2} -> {:.2}, interval {} -> {}, due {}",
        ease,
        schedule.ease,
        interval,
        schedule.interval,
        schedule.next_due.format("%Y-%m-%d"),
    );
    Ok(())
}

fn run_history(db: Option<PathBuf>, owner: &str, card_id: &str) -> anyhow::Result<()> {
    let store = Store::new(db)?;
    let card = store
        .get_card(owner, card_id)?
        .ok_or_else(|| anyhow::anyhow!("card not found: {card_id}"))?;
    let history = store.reviews_for_card(owner, card_id)?;

    print_card(&card);
    println!();
    if history.is_empty() {
        println!("{}", "Never reviewed.".dimmed());
        return Ok(());
    }

    for record in &history {
        println!(
            "{}  {}",
            record.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            record.grade.as_str(),
        );
    }
    Ok(())
}

fn print_card(card: &Card) {
    println!("{}  [{}]", card.id.dimmed(), card.kind);
    println!("{}", card.prompt.white().bold());

    // Cloze cards carry their options as a JSON string array
    if card.kind == CardKind::Cloze {
        if let Some(serde_json::Value::Array(options)) = &card.choices {
            for option in options {
                if let serde_json::Value::String(option) = option {
                    println!("  - {option}");
                }
            }
        }
    }
}
