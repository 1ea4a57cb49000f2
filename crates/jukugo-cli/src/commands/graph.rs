//! Whole-graph commands

use clap::Args;
use jukugo_service::GraphQueries;

use crate::output::format_output;
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct WipeArgs {
    /// Confirm deleting every node and edge
    #[arg(long)]
    pub yes: bool,
}

pub async fn run_stats(cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let stats = GraphQueries::new(ctx.store.clone()).stats().await?;
    println!("{}", format_output(&[stats], cli.output_format()));
    Ok(())
}

pub async fn run_wipe(args: &WipeArgs, ctx: &AppContext) -> anyhow::Result<()> {
    if !ctx.config.allow_wipe {
        anyhow::bail!(
            "Wiping is disabled. Run `jukugo config set allow_wipe true` or set JUKUGO_ALLOW_WIPE=1."
        );
    }
    if !args.yes {
        anyhow::bail!("Refusing to wipe the graph without --yes");
    }

    let queries = GraphQueries::new(ctx.store.clone());
    let before = queries.stats().await?;
    queries.wipe().await?;
    println!(
        "Wiped {} characters, {} words and {} edges",
        before.characters, before.words, before.forms
    );
    Ok(())
}
