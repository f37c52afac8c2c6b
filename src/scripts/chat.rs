//! Interactive console front end for the recommendation pipeline.
//!
//! Answers are not written to the history ledger.

use crate::{error::ApiError, models::RecommendationResult, services::RecommendationService};
use anyhow::Result;
use console::style;
use log::warn;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

fn is_exit_command(line: &str) -> bool {
    matches!(line.to_lowercase().as_str(), "exit" | "quit")
}

fn render(result: &RecommendationResult) -> String {
    let mut out = format!(
        "\n{} {}\n{}\n",
        style("Book:").bold(),
        result.title,
        result.short_recommendation
    );
    if let Some(summary) = &result.detailed_summary {
        out.push_str(&format!("\n{} {}\n", style("Detailed summary:").bold(), summary));
    }
    out.push('\n');
    out
}

/// Read queries line by line until EOF or `exit`/`quit`.
pub async fn run_chat<R, W>(
    service: &RecommendationService,
    input: R,
    mut output: W,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut answered = 0;

    output
        .write_all(b"Smart Librarian. Type 'exit' to quit.\n\n")
        .await?;

    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_exit_command(query) {
            output.write_all(b"Goodbye!\n").await?;
            break;
        }

        match service.suggest(query).await {
            Ok(result) => {
                output.write_all(render(&result).as_bytes()).await?;
                answered += 1;
            }
            Err(e @ ApiError::RetrievalUnavailable(_)) => {
                warn!("{}", e);
                output
                    .write_all(b"Bot: the book index is unavailable right now, try again.\n\n")
                    .await?;
            }
            Err(e) => {
                output
                    .write_all(format!("Bot: {}\n\n", e).as_bytes())
                    .await?;
            }
        }
    }

    output.flush().await?;
    Ok(answered)
}
