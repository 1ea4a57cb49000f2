//! Read-only graph queries

use clap::Args;
use jukugo_core::Level;
use jukugo_service::GraphQueries;

use crate::output::{format_json, format_output, OutputFormat};
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct CompoundsArgs {
    /// A single kanji
    pub kanji: String,

    /// Only compounds whose kanji are all at or below this level
    #[arg(short, long)]
    pub max_level: Option<Level>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// A single kanji
    pub kanji: String,
    /// Compound word
    pub word: String,
    /// Zero-based position of the kanji in the word
    pub position: u32,
}

#[derive(Args)]
pub struct RandomArgs {
    /// Level to pick from
    pub level: Level,

    /// Number of distractors (default: configured value)
    #[arg(short = 'n', long)]
    pub distractors: Option<usize>,
}

pub async fn run_compounds(args: &CompoundsArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let queries = GraphQueries::new(ctx.store.clone());
    let entries = match args.max_level {
        Some(level) => queries.compounds_at_level(&args.kanji, level).await?,
        None => queries.compounds_for_character(&args.kanji).await?,
    };
    tracing::info!("Found {} compounds for {}", entries.len(), args.kanji);

    let format = cli.output_format();
    if entries.is_empty() && format == OutputFormat::Table {
        println!("No compounds found for {}", args.kanji);
    } else {
        println!("{}", format_output(&entries, format));
    }
    Ok(())
}

pub async fn run_validate(args: &ValidateArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let queries = GraphQueries::new(ctx.store.clone());
    let validation = queries
        .validate_compound(&args.kanji, &args.word, args.position)
        .await?;

    if cli.output_format() == OutputFormat::Json {
        println!("{}", format_json(&validation));
        return Ok(());
    }

    match &validation.word {
        Some(word) => {
            println!(
                "valid: {} is at position {} of {}",
                args.kanji, args.position, word.text
            );
            println!("  Reading: {}", word.reading);
            println!("  Meaning: {}", word.meaning);
        }
        None => println!(
            "invalid: {} is not at position {} of {}",
            args.kanji, args.position, args.word
        ),
    }
    Ok(())
}

pub async fn run_random(args: &RandomArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let queries = GraphQueries::new(ctx.store.clone());
    let count = args.distractors.unwrap_or(ctx.config.distractors);

    let Some(challenge) = queries.random_challenge(args.level, count).await? else {
        anyhow::bail!("No characters imported at level {}", args.level);
    };

    match cli.output_format() {
        OutputFormat::Json => println!("{}", format_json(&challenge)),
        format => {
            let mut rows = vec![challenge.character];
            rows.extend(challenge.distractors);
            println!("{}", format_output(&rows, format));
        }
    }
    Ok(())
}
