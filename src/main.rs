use clap::Parser;
use tracing_subscriber::EnvFilter;

use wasmcc::cli::{Cli, Command, run_doctor_command, run_serve_command};
use wasmcc::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = Config::from_env()?;
    cli.serve_args().apply(&mut config);

    match cli.command {
        Some(Command::Doctor(_)) => run_doctor_command(&config).await,
        Some(Command::Serve(_)) | None => run_serve_command(config).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wasmcc=info,tower_http=info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
