mod cli;
mod config;
mod linker;
mod model;
mod providers;
mod util;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("create") => cli::handle_create(&args[1..]).await,
        Some("status") => cli::handle_status(),
        Some("help") | Some("-h") | Some("--help") | None => {
            cli::print_help();
            Ok(())
        }
        Some(other) => {
            cli::print_help();
            anyhow::bail!("Unknown command: {other}")
        }
    }
}
