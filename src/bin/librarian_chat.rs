use anyhow::Result;
use clap::Parser;
use log::info;
use smart_librarian::{app::AppServices, config::Config, scripts::chat::run_chat, telemetry};
use tokio::io::{stdin, stdout, BufReader};

/// Ask for book recommendations from the terminal.
#[derive(Debug, Parser)]
#[command(name = "librarian-chat", version)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "smart_librarian=warn")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(&cli.log);

    let config = Config::load()?;
    let services = AppServices::from_config(&config).await?;

    let answered = run_chat(&services.recommendations, BufReader::new(stdin()), stdout()).await?;
    info!("Answered {} questions", answered);
    Ok(())
}
