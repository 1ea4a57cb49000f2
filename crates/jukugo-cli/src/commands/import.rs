//! Import command

use std::path::PathBuf;

use clap::Args;
use jukugo_core::Level;
use jukugo_service::{ImportReport, ImportRequest, Importer};
use tokio_util::sync::CancellationToken;

use crate::output::{format_json, OutputFormat};
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct ImportArgs {
    /// Level to import (N5..N1)
    pub level: Level,

    /// JMdict XML file (overrides dictionary_path)
    #[arg(long)]
    pub dictionary: Option<PathBuf>,

    /// Character level TSV file (overrides levels_path)
    #[arg(long)]
    pub levels: Option<PathBuf>,
}

pub async fn run(args: &ImportArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let dictionary = args
        .dictionary
        .clone()
        .or_else(|| ctx.config.dictionary_path.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("No dictionary given. Pass --dictionary or set dictionary_path.")
        })?;
    let levels = ctx.levels(args.levels.as_ref()).ok_or_else(|| {
        anyhow::anyhow!("No levels file given. Pass --levels or set levels_path.")
    })?;

    // Ctrl-C cancels the run; the ingest transaction rolls back
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling import");
            on_interrupt.cancel();
        }
    });

    let importer = Importer::new(ctx.store.clone());
    let result = importer
        .import_level(
            ImportRequest::new(args.level, dictionary),
            levels.as_ref(),
            cancel,
        )
        .await;
    watcher.abort();
    let report = result?;

    match cli.output_format() {
        OutputFormat::Json => println!("{}", format_json(&report)),
        _ if cli.quiet => {}
        _ => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &ImportReport) {
    let rejected = &report.rejections;
    println!("Imported level {} (run {})", report.level, report.run_id);
    println!("  Characters: {}", report.characters);
    println!("  Compounds: {}", report.compounds);
    println!(
        "  Written: {} characters, {} words, {} edges ({} edges skipped)",
        report.written.characters_merged,
        report.written.words_merged,
        report.written.edges_merged,
        report.written.edges_skipped
    );
    println!(
        "  Parsed: {} entries ({} skipped, {} syntax errors)",
        report.parse.entries, report.parse.skipped_entries, report.parse.syntax_errors
    );
    println!(
        "  Rejected: {} (length {}, unknown {}, too advanced {}, kanji count {}, irrelevant {})",
        rejected.total(),
        rejected.length,
        rejected.unknown_character,
        rejected.too_advanced,
        rejected.kanji_count,
        rejected.irrelevant
    );
    println!("  Took: {} ms", report.duration_ms);
}
