//! Serve command: MCP over stdio, or HTTP/SSE with the `sse` feature

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use jukugo_mcp::{McpServer, ServerSettings};

use crate::AppContext;

#[derive(Args)]
pub struct ServeArgs {
    /// JMdict XML file used by import_level (overrides dictionary_path)
    #[arg(long)]
    pub dictionary: Option<PathBuf>,

    /// Character level TSV file (overrides levels_path)
    #[arg(long)]
    pub levels: Option<PathBuf>,

    /// Serve HTTP/SSE on this address instead of stdio
    #[cfg(feature = "sse")]
    #[arg(long, value_name = "ADDR")]
    pub sse: Option<String>,

    /// Bearer token required by the HTTP routes
    #[cfg(feature = "sse")]
    #[arg(long, env = "JUKUGO_SSE_TOKEN")]
    pub token: Option<String>,
}

pub async fn run(args: &ServeArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let settings = ServerSettings {
        dictionary: args
            .dictionary
            .clone()
            .or_else(|| ctx.config.dictionary_path.clone()),
        allow_wipe: ctx.config.allow_wipe,
        distractors: ctx.config.distractors,
    };
    let levels = ctx.levels_or_empty(args.levels.as_ref());
    let server = Arc::new(McpServer::new(ctx.store.clone(), levels, settings));

    #[cfg(feature = "sse")]
    {
        if let Some(addr) = &args.sse {
            let on_shutdown = Arc::clone(&server);
            let shutdown = async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutting down");
                }
                on_shutdown.shutdown();
            };
            return jukugo_mcp::run_sse_server(server, addr, args.token.clone(), shutdown).await;
        }
    }

    tracing::info!("Starting MCP server on stdio...");
    let result = server.run_stdio().await;
    server.shutdown();
    result
}
