use crate::prelude::{eprintln, *};
use colored::Colorize;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Answer newline-delimited JSON-RPC messages on stdin until it closes.
///
/// Stdout carries protocol traffic only; diagnostics go to stderr.
pub async fn run_stdio(global: crate::Global) -> Result<()> {
    log::info!("codeprompt MCP server reading requests from stdin");
    if global.verbose {
        eprintln!(
            "{} codeprompt tools on stdio (import_repository, fetch_urls, analyze_code, format_prompt, list_styles)",
            "Serving".green().bold()
        );
    }

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut line = String::new();
    let mut served = 0usize;

    while reader.read_line(&mut line).await? > 0 {
        let message = line.trim();
        if !message.is_empty() {
            let label = super::describe_request(message);
            let started = Instant::now();
            log::debug!("stdio request: {label}");

            let response = super::handle_request(message, &global).await;
            let encoded = serde_json::to_string(&response)?;
            stdout.write_all(encoded.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
            served += 1;

            if global.verbose {
                eprintln!(
                    "{} {label}: {} ({} ms, {} bytes)",
                    "mcp".cyan(),
                    response.outcome(),
                    started.elapsed().as_millis(),
                    encoded.len()
                );
            }
        }
        line.clear();
    }

    log::info!("stdin closed after {served} request(s), MCP server stopping");
    Ok(())
}
