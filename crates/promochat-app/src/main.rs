use anyhow::Result;
use clap::Parser;

use promochat_app::app::{run_once_mode, run_repl_mode, setup_from_cli};
use promochat_app::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    promochat_logging::init_logger(cli.verbose);

    let app_config = setup_from_cli(&cli)?;

    if let Some(text) = cli.once.as_deref() {
        return run_once_mode(&app_config.orchestrator, text).await;
    }

    run_repl_mode(&cli, app_config).await
}
