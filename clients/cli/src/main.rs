use clap::Parser;
use colored::Colorize;
use dotenvy::dotenv;
use fury_cli::{run_cli, Cli};
use tracing::log::info;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    // Load .env file before parsing, so that it can feed `env` fallbacks.
    // Best effort.
    let dotenv_result = dotenv();
    let args = Cli::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();
    if let Err(e) = dotenv_result {
        info!("Didn't load .env file: {e}");
    };
    if let Err(err) = run_cli(args).await {
        eprintln!("{}", err.to_string().red());
        std::process::exit(1);
    };
}
